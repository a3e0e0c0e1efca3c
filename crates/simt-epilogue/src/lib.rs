//! Epilogue pipeline for tiled SIMT matrix-multiply and convolution
//! kernels.
//!
//! The epilogue is the stage that turns raw per-lane accumulator values
//! into a finished output tensor. It reconciles three layouts — the
//! register arrangement produced by the compute lanes, a compact staging
//! layout in threadblock-shared memory, and the caller's logical tensor
//! layout (row-major or channel-interleaved) — while applying scale, bias,
//! clamping and numeric conversion, fully predicated against tile
//! boundaries.
//!
//! # Pipeline
//!
//! Per iteration of the warp tiling policy:
//!
//! 1. each warp's [`FragmentIterator`] supplies one fragment per lane;
//! 2. the [`WarpTileIterator`] deposits it into the shared staging buffer;
//! 3. a threadblock-wide barrier makes all deposits visible;
//! 4. the shared load path reassembles the compacted tile, summing split-K
//!    partitions;
//! 5. the output functor scales, adds per-channel bias, clamps and
//!    converts;
//! 6. the predicated output iterator stores every in-bounds element.
//!
//! # Quick start
//!
//! ```
//! use simt_epilogue::prelude::*;
//!
//! // A 64x64 threadblock tile: two 32x64 warps stacked along the rows.
//! let policy = SimtPolicy::WARP_32X64;
//! let config = EpilogueConfig::new(policy, OutputLayout::RowMajor, 2, 1);
//!
//! // Accumulators normally come from the compute stage; encode the global
//! // coordinate so the result is easy to check.
//! let warps: Vec<WarpAccumulators<f32>> = (0..2)
//!     .map(|m| {
//!         WarpAccumulators::from_fn(policy, move |c| {
//!             ((m * 32 + c.row) * 64 + c.column) as f32
//!         })
//!     })
//!     .collect();
//!
//! let mut data = vec![0.0f32; 64 * 64];
//! let mut dst = TensorMut::from_slice(&mut data, MatrixShape::new(64, 64), OutputLayout::RowMajor);
//!
//! // out = 1.0 * acc, converted to f32.
//! let op = LinearCombination::<f32, f32>::new(1.0, 0.0);
//! run_epilogue(config, &warps, &op, &mut dst, None, MatrixCoord::new(0, 0))?;
//!
//! assert_eq!(data[5 * 64 + 7], (5 * 64 + 7) as f32);
//! # Ok::<(), simt_epilogue::EpilogueError>(())
//! ```
//!
//! # Boundary tiles and split-K
//!
//! Stores are predicated: a tile whose trailing rows or columns fall
//! outside the destination extent writes exactly the in-bounds elements.
//! With `partitions_k > 1`, each partition contributes a full warp set of
//! partial sums for the same tile; the pipeline reduces them during the
//! shared-memory round trip before the functor runs.

mod api;
mod error;

pub use api::{run_epilogue, Epilogue};
pub use error::{EpilogueError, Result};

// Re-export the component and vocabulary types at the crate root.
pub use simt_epilogue_core::{
    AccumulatorTile, BiasTileIterator, CompactedTile, EpilogueConfig, Fragment, FragmentIterator,
    LinearCombination, LinearCombinationClamp, OutputOp, OutputTileIterator, SharedLoadIterator,
    SharedStagingBuffer, SimtPolicy, ThreadblockEpilogue, WarpAccumulators, WarpTileIterator,
};
pub use simt_epilogue_types::{
    AccumulatorElement, FromAccumulator, MatrixCoord, MatrixShape, OutputLayout, TensorMut,
    TensorRef,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{
        run_epilogue, AccumulatorElement, Epilogue, EpilogueConfig, EpilogueError,
        FromAccumulator, LinearCombination, LinearCombinationClamp, MatrixCoord, MatrixShape,
        OutputLayout, OutputOp, SimtPolicy, TensorMut, TensorRef, WarpAccumulators,
    };
}
