//! Threadblock-scoped epilogue orchestration.
//!
//! One invocation drains every warp's accumulators through the shared
//! staging buffer, reduces split-K partitions, applies the output functor
//! and performs the predicated store:
//!
//! ```text
//! Init -> { Gather, Reduce?, Transform, Store } x iterations -> Done
//! ```
//!
//! The single safety-critical ordering rule lives here: a threadblock-wide
//! barrier separates every warp write phase from the shared read phase, and
//! the staging buffer is only reused after that barrier.

use simt_epilogue_types::{
    AccumulatorElement, MatrixCoord, MatrixShape, OutputLayout, TensorMut, TensorRef,
};

use crate::accumulator::{Fragment, FragmentIterator, WarpAccumulators};
use crate::output_op::OutputOp;
use crate::output_tile::{BiasTileIterator, OutputTileIterator};
use crate::policy::SimtPolicy;
use crate::staging::{CompactedTile, SharedLoadIterator, SharedStagingBuffer, WarpTileIterator};

/// Extra staging elements between logical rows, avoiding bank conflicts
/// between lanes of adjacent rows.
const STAGING_ROW_PADDING: usize = 4;

/// Static description of one threadblock's epilogue.
///
/// Warps tile the threadblock rows; split-K partitions replicate that
/// arrangement, each contributing partial sums for the same output tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpilogueConfig {
    /// Warp-scoped tiling policy.
    pub policy: SimtPolicy,
    /// Destination tensor layout.
    pub layout: OutputLayout,
    /// Warps stacked along the tile rows.
    pub warps_per_block: usize,
    /// Split-K partition count; 1 disables cross-partition reduction.
    pub partitions_k: usize,
}

impl EpilogueConfig {
    /// Create a configuration.
    pub const fn new(
        policy: SimtPolicy,
        layout: OutputLayout,
        warps_per_block: usize,
        partitions_k: usize,
    ) -> Self {
        Self {
            policy,
            layout,
            warps_per_block,
            partitions_k,
        }
    }

    /// Check the configuration's internal consistency.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.warps_per_block == 0 {
            return Err("threadblock needs at least one warp");
        }
        if self.partitions_k == 0 {
            return Err("split-K partition count must be at least 1");
        }
        self.policy.check_layout(self.layout)
    }

    /// Output tile shape covered by the threadblock.
    pub const fn threadblock_shape(&self) -> MatrixShape {
        MatrixShape::new(
            self.warps_per_block * self.policy.warp_shape.row,
            self.policy.warp_shape.column,
        )
    }

    /// Total warps, including split-K replicas.
    pub const fn warp_count(&self) -> usize {
        self.warps_per_block * self.partitions_k
    }
}

/// The threadblock epilogue: staging memory plus the iterators that drive
/// one drain-transform-store pass.
///
/// Holds no state across invocations beyond the reusable staging
/// allocation; `run` is a single deterministic pass per output tile.
#[derive(Debug)]
pub struct ThreadblockEpilogue<A> {
    config: EpilogueConfig,
    staging: SharedStagingBuffer<A>,
    shared_load: SharedLoadIterator,
    compacted: CompactedTile<A>,
}

impl<A: AccumulatorElement> ThreadblockEpilogue<A> {
    /// Allocate an epilogue for the given configuration.
    pub fn new(config: EpilogueConfig) -> Result<Self, &'static str> {
        config.validate()?;
        let policy = config.policy;
        let staging_rows = config.warp_count() * policy.rows_per_iteration;
        let columns = policy.warp_shape.column;
        Ok(Self {
            config,
            staging: SharedStagingBuffer::new(staging_rows, columns, STAGING_ROW_PADDING),
            shared_load: SharedLoadIterator::new(
                policy,
                config.layout,
                config.warps_per_block,
                config.partitions_k,
            ),
            compacted: CompactedTile::zeroed(
                config.warps_per_block * policy.rows_per_iteration,
                columns,
            ),
        })
    }

    /// The configuration this epilogue was built for.
    #[inline]
    pub fn config(&self) -> &EpilogueConfig {
        &self.config
    }

    /// Run the full pass for one output tile.
    ///
    /// `warps` are ordered partition-major: index `k * warps_per_block + m`
    /// holds partition `k`'s warp covering row block `m`. The destination
    /// is mutated in place; elements whose coordinates fall outside the
    /// destination extent are masked. The caller-supplied `tile_origin`
    /// must be consistent with the destination extent.
    ///
    /// # Panics
    /// Panics if `warps` does not match the configured warp count or
    /// policy. Use the crate-level entry point for a fallible boundary.
    pub fn run<Op>(
        &mut self,
        warps: &[WarpAccumulators<A>],
        output_op: &Op,
        destination: &mut TensorMut<'_, Op::Output>,
        bias: Option<&TensorRef<'_, A>>,
        tile_origin: MatrixCoord,
    ) where
        Op: OutputOp<A>,
    {
        let policy = self.config.policy;
        assert_eq!(
            warps.len(),
            self.config.warp_count(),
            "warp accumulator count does not match the configuration"
        );
        assert!(
            warps.iter().all(|w| *w.policy() == policy),
            "warp accumulator policy does not match the configuration"
        );

        let columns = policy.warp_shape.column;
        let mut output = OutputTileIterator::new(destination, tile_origin);

        // Bias is constant per channel: read the tile's channel range once.
        let bias_values = if output_op.is_bias_needed() {
            BiasTileIterator::new(bias, tile_origin.column).load_channels(columns)
        } else {
            vec![A::accum_zero(); columns]
        };

        let mut fragment_iters: Vec<Vec<FragmentIterator<'_, A>>> = warps
            .iter()
            .map(|warp| {
                (0..policy.lane_count())
                    .map(|lane| FragmentIterator::new(warp.lane(lane)))
                    .collect()
            })
            .collect();
        let mut fragment = Fragment::zeroed(&policy);

        for iteration in 0..policy.iterations {
            // Gather: every warp drains one fragment per lane into staging.
            for (warp_index, lane_iters) in fragment_iters.iter_mut().enumerate() {
                let warp_tile = WarpTileIterator::new(policy, self.config.layout, warp_index);
                for (lane, lane_iter) in lane_iters.iter_mut().enumerate() {
                    lane_iter.load(&mut fragment, 0);
                    warp_tile.store(lane, &fragment, &mut self.staging);
                    lane_iter.advance();
                }
            }

            // Barrier: deposits must be visible before any cross-warp read,
            // and staging may only be overwritten after it.
            self.staging.sync_threadblock();

            // Reduce happens inside the compacted load when partitions_k > 1.
            self.shared_load
                .load_compacted(&self.staging, &mut self.compacted);

            // Transform and predicated store.
            for local_row in 0..self.compacted.rows() {
                let warp_m = local_row / policy.rows_per_iteration;
                let lane_row = local_row % policy.rows_per_iteration;
                let tile_row = warp_m * policy.warp_shape.row
                    + iteration * policy.rows_per_iteration
                    + lane_row;
                for column in 0..columns {
                    let value = output_op.apply(
                        self.compacted.get(local_row, column),
                        bias_values[column],
                    );
                    output.store(MatrixCoord::new(tile_row, column), value);
                }
            }
        }
    }
}
