//! Shared staging buffer and the warp/threadblock tile iterators over it.
//!
//! Each iteration, every warp deposits one fragment per lane into the
//! staging buffer; after a threadblock-wide synchronization the compacted
//! tile is read back, summing across split-K partitions. Rows are padded so
//! that consecutive logical rows never share a memory bank.
//!
//! # Layout
//! For a 2-warp threadblock with 4 rows per iteration and 2-wide padding:
//! ```text
//! row 0  warp 0, lane-row 0:  e e e e e e e e | p p
//! row 1  warp 0, lane-row 1:  e e e e e e e e | p p
//! ...
//! row 4  warp 1, lane-row 0:  e e e e e e e e | p p
//! ...
//! ```
//! With a channel-interleaved destination the element chunks within a row
//! are additionally permuted so the later global store reads contiguous
//! runs; the permutation is internal and cancels out on the read path.

use simt_epilogue_types::{AccumulatorElement, OutputLayout};

use crate::accumulator::Fragment;
use crate::policy::SimtPolicy;

/// Staged position of one vector-width chunk within a row.
///
/// Row-major destinations stage chunks in logical order. Interleaved
/// destinations transpose chunk order so each channel group's chunks end up
/// adjacent across groups, which is what makes the downstream global store
/// contiguous.
pub(crate) fn staged_chunk_index(
    chunk: usize,
    chunks_per_row: usize,
    layout: OutputLayout,
    elements_per_access: usize,
) -> usize {
    match layout {
        OutputLayout::RowMajor => chunk,
        OutputLayout::ChannelInterleaved { factor } => {
            let chunks_per_group = factor / elements_per_access;
            let groups = chunks_per_row / chunks_per_group;
            let group = chunk / chunks_per_group;
            let within = chunk % chunks_per_group;
            within * groups + group
        }
    }
}

/// Memory shared by all warps of a threadblock during the epilogue.
///
/// The buffer is logically owned by the orchestration for one iteration at
/// a time. Writers mark it dirty; `sync_threadblock` is the barrier that
/// makes deposits visible, and reading while writes are pending is a
/// staleness hazard surfaced by a debug assertion.
#[derive(Debug)]
pub struct SharedStagingBuffer<A> {
    data: Box<[A]>,
    rows: usize,
    logical_columns: usize,
    row_stride: usize,
    pending_writes: bool,
}

impl<A: AccumulatorElement> SharedStagingBuffer<A> {
    /// Allocate a zeroed staging buffer.
    ///
    /// `row_padding` extra elements separate consecutive rows.
    pub fn new(rows: usize, logical_columns: usize, row_padding: usize) -> Self {
        let row_stride = logical_columns + row_padding;
        Self {
            data: vec![A::accum_zero(); rows * row_stride].into_boxed_slice(),
            rows,
            logical_columns,
            row_stride,
            pending_writes: false,
        }
    }

    /// Number of staging rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Elements per logical row, excluding padding.
    #[inline]
    pub fn logical_columns(&self) -> usize {
        self.logical_columns
    }

    /// Threadblock-wide barrier: all prior deposits become visible and the
    /// buffer may be read, then overwritten by the next iteration.
    #[inline]
    pub fn sync_threadblock(&mut self) {
        self.pending_writes = false;
    }

    /// Deposit one vector-width chunk.
    pub fn write_chunk(&mut self, row: usize, column: usize, values: &[A]) {
        debug_assert!(
            column + values.len() <= self.logical_columns,
            "chunk write past logical row end"
        );
        let start = row * self.row_stride + column;
        self.data[start..start + values.len()].copy_from_slice(values);
        self.pending_writes = true;
    }

    /// Read one vector-width chunk.
    ///
    /// Precondition: no deposit may be pending; callers must synchronize
    /// between the write and read phases.
    pub fn read_chunk(&self, row: usize, column: usize, len: usize) -> &[A] {
        debug_assert!(
            !self.pending_writes,
            "staging read before threadblock synchronization"
        );
        debug_assert!(
            column + len <= self.logical_columns,
            "chunk read past logical row end"
        );
        let start = row * self.row_stride + column;
        &self.data[start..start + len]
    }
}

/// Warp-scoped iterator placing fragments into (and out of) the staging
/// buffer.
///
/// The position of a lane's deposit is fixed by the warp's staging row
/// block, the lane id and the per-layout chunk permutation. The iterator
/// performs no synchronization; ordering across warps is the caller's
/// responsibility.
#[derive(Debug, Clone, Copy)]
pub struct WarpTileIterator {
    policy: SimtPolicy,
    layout: OutputLayout,
    row_offset: usize,
}

impl WarpTileIterator {
    /// Iterator for the warp at `warp_index` within the threadblock.
    pub fn new(policy: SimtPolicy, layout: OutputLayout, warp_index: usize) -> Self {
        Self {
            policy,
            layout,
            row_offset: warp_index * policy.rows_per_iteration,
        }
    }

    fn lane_position(&self, lane: usize, access: usize) -> (usize, usize) {
        let lane_row = lane / self.policy.lane_shape.column;
        let lane_column = lane % self.policy.lane_shape.column;
        let chunks_per_row = self.policy.warp_shape.column / self.policy.elements_per_access;
        let logical_chunk = lane_column + access * self.policy.lane_shape.column;
        let staged = staged_chunk_index(
            logical_chunk,
            chunks_per_row,
            self.layout,
            self.policy.elements_per_access,
        );
        (
            self.row_offset + lane_row,
            staged * self.policy.elements_per_access,
        )
    }

    /// Deposit one lane's fragment for the current iteration.
    pub fn store<A: AccumulatorElement>(
        &self,
        lane: usize,
        fragment: &Fragment<A>,
        staging: &mut SharedStagingBuffer<A>,
    ) {
        debug_assert!(lane < self.policy.lane_count(), "lane index out of range");
        for access in 0..self.policy.accesses_per_iteration {
            let (row, column) = self.lane_position(lane, access);
            staging.write_chunk(row, column, fragment.access(access));
        }
    }

    /// Symmetric read path: gather one lane's staged fragment back into
    /// registers.
    pub fn load<A: AccumulatorElement>(
        &self,
        lane: usize,
        fragment: &mut Fragment<A>,
        staging: &SharedStagingBuffer<A>,
    ) {
        debug_assert!(lane < self.policy.lane_count(), "lane index out of range");
        for access in 0..self.policy.accesses_per_iteration {
            let (row, column) = self.lane_position(lane, access);
            fragment
                .access_mut(access)
                .copy_from_slice(staging.read_chunk(row, column, self.policy.elements_per_access));
        }
    }
}

/// The compacted tile one iteration produces at threadblock scope: all
/// warps' rows for this iteration, in logical column order, with split-K
/// partitions already reduced.
#[derive(Debug, Clone)]
pub struct CompactedTile<A> {
    rows: usize,
    columns: usize,
    data: Vec<A>,
}

impl<A: AccumulatorElement> CompactedTile<A> {
    /// A zeroed tile.
    pub fn zeroed(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![A::accum_zero(); rows * columns],
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Value at (row, column).
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> A {
        self.data[row * self.columns + column]
    }

    #[inline]
    fn set(&mut self, row: usize, column: usize, value: A) {
        self.data[row * self.columns + column] = value;
    }

    fn fill_zero(&mut self) {
        self.data.fill(A::accum_zero());
    }
}

/// Threadblock-scoped iterator reading the compacted tile out of staging.
///
/// Rows staged by warps covering the same output coordinates from
/// different split-K partitions are summed; partition order is fixed by
/// the iteration schedule, so the reduction is deterministic for a given
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct SharedLoadIterator {
    policy: SimtPolicy,
    layout: OutputLayout,
    warps_per_block: usize,
    partitions_k: usize,
}

impl SharedLoadIterator {
    /// Iterator for a threadblock of `warps_per_block` row-covering warps
    /// and `partitions_k` split-K partitions.
    pub fn new(
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

    /// Read one iteration's compacted tile, reducing across partitions.
    pub fn load_compacted<A: AccumulatorElement>(
        &self,
        staging: &SharedStagingBuffer<A>,
        out: &mut CompactedTile<A>,
    ) {
        let rows_per_iteration = self.policy.rows_per_iteration;
        let width = self.policy.elements_per_access;
        let chunks_per_row = self.policy.warp_shape.column / width;

        out.fill_zero();
        for warp_m in 0..self.warps_per_block {
            for r in 0..rows_per_iteration {
                let local_row = warp_m * rows_per_iteration + r;
                for chunk in 0..chunks_per_row {
                    let staged = staged_chunk_index(chunk, chunks_per_row, self.layout, width);
                    for partition in 0..self.partitions_k {
                        let staging_row = (partition * self.warps_per_block + warp_m)
                            * rows_per_iteration
                            + r;
                        let values = staging.read_chunk(staging_row, staged * width, width);
                        for (i, v) in values.iter().enumerate() {
                            let column = chunk * width + i;
                            out.set(local_row, column, out.get(local_row, column).accum_add(*v));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::{AccumulatorTile, Fragment, FragmentIterator, WarpAccumulators};
    use simt_epilogue_types::MatrixShape;

    fn policy() -> SimtPolicy {
        SimtPolicy::new(MatrixShape::new(8, 8), MatrixShape::new(4, 2), 2)
    }

    #[test]
    fn test_staged_chunk_index_row_major_is_identity() {
        for chunk in 0..16 {
            assert_eq!(
                staged_chunk_index(chunk, 16, OutputLayout::RowMajor, 4),
                chunk
            );
        }
    }

    #[test]
    fn test_staged_chunk_index_interleaved_is_a_bijection() {
        let layout = OutputLayout::ChannelInterleaved { factor: 4 };
        // 16 columns of 2-wide chunks: 8 chunks, groups of 2 chunks.
        let chunks = 8;
        let mut seen = vec![false; chunks];
        for chunk in 0..chunks {
            let staged = staged_chunk_index(chunk, chunks, layout, 2);
            assert!(staged < chunks);
            assert!(!seen[staged]);
            seen[staged] = true;
        }
    }

    #[test]
    fn test_warp_store_load_round_trip() {
        let policy = policy();
        let tile = AccumulatorTile::new(
            policy,
            (0..policy.accumulator_element_count)
                .map(|i| i as f32)
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let mut staging = SharedStagingBuffer::new(policy.rows_per_iteration, 8, 2);
        let warp_iter = WarpTileIterator::new(policy, OutputLayout::RowMajor, 0);

        let iter = FragmentIterator::new(&tile);
        let mut frag = Fragment::zeroed(&policy);
        iter.load(&mut frag, 0);

        // One lane's deposit comes back bit-identical after the barrier.
        warp_iter.store(3, &frag, &mut staging);
        staging.sync_threadblock();
        let mut read_back = Fragment::zeroed(&policy);
        warp_iter.load(3, &mut read_back, &staging);
        assert_eq!(frag, read_back);
    }

    #[test]
    fn test_warp_round_trip_interleaved() {
        let policy = policy();
        let layout = OutputLayout::ChannelInterleaved { factor: 4 };
        let mut staging = SharedStagingBuffer::new(policy.rows_per_iteration, 8, 2);
        let warp_iter = WarpTileIterator::new(policy, layout, 0);

        let tile = AccumulatorTile::new(
            policy,
            (0..policy.accumulator_element_count)
                .map(|i| i as f32 + 0.25)
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let iter = FragmentIterator::new(&tile);
        let mut frag = Fragment::zeroed(&policy);
        iter.load(&mut frag, 0);

        warp_iter.store(0, &frag, &mut staging);
        staging.sync_threadblock();
        let mut read_back = Fragment::zeroed(&policy);
        warp_iter.load(0, &mut read_back, &staging);
        assert_eq!(frag, read_back);
    }

    #[test]
    fn test_compacted_tile_reassembles_logical_columns() {
        // Stage the whole warp for one iteration and check the compacted
        // tile matches the accumulator coordinates.
        let policy = policy();
        let warp = WarpAccumulators::from_fn(policy, |c| (c.row * 10 + c.column) as f32);
        let mut staging = SharedStagingBuffer::new(policy.rows_per_iteration, 8, 2);
        let warp_iter = WarpTileIterator::new(policy, OutputLayout::RowMajor, 0);

        let mut frag = Fragment::zeroed(&policy);
        for lane in 0..policy.lane_count() {
            let iter = FragmentIterator::new(warp.lane(lane));
            iter.load(&mut frag, 0);
            warp_iter.store(lane, &frag, &mut staging);
        }
        staging.sync_threadblock();

        let loader = SharedLoadIterator::new(policy, OutputLayout::RowMajor, 1, 1);
        let mut compacted = CompactedTile::zeroed(policy.rows_per_iteration, 8);
        loader.load_compacted(&staging, &mut compacted);

        for row in 0..policy.rows_per_iteration {
            for column in 0..8 {
                assert_eq!(compacted.get(row, column), (row * 10 + column) as f32);
            }
        }
    }

    #[test]
    fn test_split_k_partitions_are_summed() {
        let policy = policy();
        // Two partitions staging constant 3.0 and 4.0 for the same rows.
        let mut staging = SharedStagingBuffer::new(2 * policy.rows_per_iteration, 8, 2);
        let mut frag = Fragment::zeroed(&policy);

        for (partition, value) in [(0usize, 3.0f32), (1, 4.0)] {
            let tile = AccumulatorTile::new(
                policy,
                vec![value; policy.accumulator_element_count],
            )
            .unwrap();
            let warp_iter = WarpTileIterator::new(policy, OutputLayout::RowMajor, partition);
            for lane in 0..policy.lane_count() {
                let iter = FragmentIterator::new(&tile);
                iter.load(&mut frag, 0);
                warp_iter.store(lane, &frag, &mut staging);
            }
        }
        staging.sync_threadblock();

        let loader = SharedLoadIterator::new(policy, OutputLayout::RowMajor, 1, 2);
        let mut compacted = CompactedTile::zeroed(policy.rows_per_iteration, 8);
        loader.load_compacted(&staging, &mut compacted);

        for row in 0..policy.rows_per_iteration {
            for column in 0..8 {
                assert_eq!(compacted.get(row, column), 7.0);
            }
        }
    }

    #[test]
    #[should_panic(expected = "threadblock synchronization")]
    #[cfg(debug_assertions)]
    fn test_read_before_sync_asserts() {
        let policy = policy();
        let mut staging = SharedStagingBuffer::<f32>::new(policy.rows_per_iteration, 8, 2);
        staging.write_chunk(0, 0, &[1.0, 2.0]);
        let _ = staging.read_chunk(0, 0, 2);
    }
}
