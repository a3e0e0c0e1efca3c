//! Shared vocabulary types for the SIMT epilogue pipeline.
//!
//! This crate holds the small value types the epilogue components agree on:
//! tile shapes and coordinates, the accumulator element trait, saturating
//! numeric conversion, destination layout tags and the predicated tensor
//! views used for output and bias access.
//!
//! It carries no dependencies and no pipeline logic of its own.

mod element;
mod layout;
mod shape;
mod tensor;

pub use element::{AccumulatorElement, FromAccumulator};
pub use layout::OutputLayout;
pub use shape::{MatrixCoord, MatrixShape};
pub use tensor::{TensorMut, TensorRef};
