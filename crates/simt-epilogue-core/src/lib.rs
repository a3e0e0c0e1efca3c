//! Core components of the SIMT epilogue pipeline.
//!
//! The epilogue converts per-lane accumulator values into a finished output
//! tensor: accumulators are drained in fragment-sized steps through a
//! shared staging buffer, split-K partial sums are reduced, an output
//! functor applies scale/bias/clamp/conversion and a predicated iterator
//! stores the result.
//!
//! Components, bottom-up:
//!
//! - [`SimtPolicy`] — compile-time iteration counts and access granularity
//!   derived from the warp tile and lane arrangement.
//! - [`FragmentIterator`] — walks one lane's accumulator tile in
//!   fragment-sized chunks.
//! - [`WarpTileIterator`] / [`SharedLoadIterator`] — the round trip through
//!   the [`SharedStagingBuffer`], including per-layout interleaving and the
//!   split-K reduction.
//! - [`ThreadblockEpilogue`] — orchestrates the whole pass under the
//!   barrier discipline.
//!
//! # Example
//!
//! ```
//! use simt_epilogue_core::{
//!     EpilogueConfig, LinearCombination, SimtPolicy, ThreadblockEpilogue, WarpAccumulators,
//! };
//! use simt_epilogue_types::{MatrixCoord, MatrixShape, OutputLayout, TensorMut};
//!
//! let policy = SimtPolicy::WARP_32X64;
//! let config = EpilogueConfig::new(policy, OutputLayout::RowMajor, 2, 1);
//!
//! // One warp per 32-row block; accumulators encode their tile row.
//! let warps: Vec<WarpAccumulators<f32>> = (0..2)
//!     .map(|m| WarpAccumulators::from_fn(policy, move |c| (m * 32 + c.row) as f32))
//!     .collect();
//!
//! let mut data = vec![0.0f32; 64 * 64];
//! let mut dst = TensorMut::from_slice(&mut data, MatrixShape::new(64, 64), OutputLayout::RowMajor);
//!
//! let op = LinearCombination::<f32, f32>::new(1.0, 0.0);
//! let mut epilogue = ThreadblockEpilogue::new(config).unwrap();
//! epilogue.run(&warps, &op, &mut dst, None, MatrixCoord::new(0, 0));
//!
//! assert_eq!(data[63 * 64], 63.0);
//! ```

mod accumulator;
mod epilogue;
mod output_op;
mod output_tile;
mod policy;
mod staging;

pub use accumulator::{AccumulatorTile, Fragment, FragmentIterator, WarpAccumulators};
pub use epilogue::{EpilogueConfig, ThreadblockEpilogue};
pub use output_op::{LinearCombination, LinearCombinationClamp, OutputOp};
pub use output_tile::{BiasTileIterator, OutputTileIterator};
pub use policy::SimtPolicy;
pub use staging::{CompactedTile, SharedLoadIterator, SharedStagingBuffer, WarpTileIterator};
