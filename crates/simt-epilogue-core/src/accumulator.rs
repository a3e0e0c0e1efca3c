//! Accumulator storage and the warp-scoped fragment iterator.
//!
//! The accumulator tile is typically the largest block of register-backed
//! state in the kernel; it is drained through the staging buffer in
//! fragment-sized steps so the staging footprint stays bounded regardless
//! of the tile size.

use simt_epilogue_types::{AccumulatorElement, MatrixCoord};

use crate::policy::SimtPolicy;

/// One lane's accumulator values for a full warp tile.
///
/// An owned, fixed-length buffer whose length is dictated by the policy.
/// It is read-only for the duration of the epilogue; sub-views are handed
/// out at access granularity with slice bounds checking.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorTile<A> {
    policy: SimtPolicy,
    data: Box<[A]>,
}

impl<A: AccumulatorElement> AccumulatorTile<A> {
    /// Wrap accumulator values produced by the compute stage.
    pub fn new(policy: SimtPolicy, data: Vec<A>) -> Result<Self, &'static str> {
        if data.len() != policy.accumulator_element_count {
            return Err("accumulator length does not match the policy");
        }
        Ok(Self {
            policy,
            data: data.into_boxed_slice(),
        })
    }

    /// A tile of additive identities.
    pub fn zeroed(policy: SimtPolicy) -> Self {
        Self {
            policy,
            data: vec![A::accum_zero(); policy.accumulator_element_count].into_boxed_slice(),
        }
    }

    /// The policy this tile was shaped by.
    #[inline]
    pub fn policy(&self) -> &SimtPolicy {
        &self.policy
    }

    /// All accumulator values, iteration-major.
    #[inline]
    pub fn as_slice(&self) -> &[A] {
        &self.data
    }

    /// One vector-width sub-view, indexed across the whole tile.
    #[inline]
    pub fn access(&self, index: usize) -> &[A] {
        let width = self.policy.elements_per_access;
        &self.data[index * width..(index + 1) * width]
    }
}

/// A fragment: the slice of a lane's accumulators moved in one iteration.
///
/// Fragments are transient staging registers; they have no identity beyond
/// one iteration step and are freely reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<A> {
    data: Box<[A]>,
    elements_per_access: usize,
}

impl<A: AccumulatorElement> Fragment<A> {
    /// A zeroed fragment sized for one iteration under `policy`.
    pub fn zeroed(policy: &SimtPolicy) -> Self {
        Self {
            data: vec![A::accum_zero(); policy.elements_per_iteration].into_boxed_slice(),
            elements_per_access: policy.elements_per_access,
        }
    }

    /// Number of elements in the fragment.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the fragment is empty (never true for a valid policy).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All fragment elements.
    #[inline]
    pub fn as_slice(&self) -> &[A] {
        &self.data
    }

    /// One vector-width sub-view.
    #[inline]
    pub fn access(&self, index: usize) -> &[A] {
        let width = self.elements_per_access;
        &self.data[index * width..(index + 1) * width]
    }

    /// One mutable vector-width sub-view.
    #[inline]
    pub fn access_mut(&mut self, index: usize) -> &mut [A] {
        let width = self.elements_per_access;
        &mut self.data[index * width..(index + 1) * width]
    }
}

/// Iterator over the fragments of one lane's accumulator tile.
///
/// The iterator is a cursor: `advance`/`retreat` move by one iteration step
/// and `load` copies the fragment at the current position. Positions are
/// not range-checked on the hot path; advancing past the policy's
/// iteration count and then loading is a precondition violation, caught by
/// a debug assertion only.
#[derive(Debug)]
pub struct FragmentIterator<'a, A> {
    tile: &'a AccumulatorTile<A>,
    index: isize,
}

impl<'a, A: AccumulatorElement> FragmentIterator<'a, A> {
    /// Start a cursor at the first fragment.
    pub fn new(tile: &'a AccumulatorTile<A>) -> Self {
        Self { tile, index: 0 }
    }

    /// Advance by one iteration step.
    #[inline]
    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// Retreat by one iteration step.
    #[inline]
    pub fn retreat(&mut self) {
        self.index -= 1;
    }

    /// Copy the fragment at the current position, displaced by
    /// `index_offset` iterations, into `fragment`.
    ///
    /// Pure with respect to the tile: repeated loads at one position yield
    /// identical fragments.
    pub fn load(&self, fragment: &mut Fragment<A>, index_offset: isize) {
        let policy = self.tile.policy();
        let position = self.index + index_offset;
        debug_assert!(
            position >= 0 && (position as usize) < policy.iterations,
            "fragment position {} outside 0..{}",
            position,
            policy.iterations
        );

        let base = position as usize * policy.accesses_per_iteration;
        for n in 0..policy.accesses_per_iteration {
            fragment
                .access_mut(n)
                .copy_from_slice(self.tile.access(base + n));
        }
    }
}

/// Accumulator tiles for every lane of one warp.
///
/// Lanes are indexed row-major over the policy's lane arrangement, matching
/// the hardware lane id.
#[derive(Debug, Clone)]
pub struct WarpAccumulators<A> {
    policy: SimtPolicy,
    lanes: Vec<AccumulatorTile<A>>,
}

impl<A: AccumulatorElement> WarpAccumulators<A> {
    /// Wrap per-lane tiles handed over by the compute stage.
    pub fn new(policy: SimtPolicy, lanes: Vec<AccumulatorTile<A>>) -> Result<Self, &'static str> {
        if lanes.len() != policy.lane_count() {
            return Err("lane count does not match the policy");
        }
        if lanes.iter().any(|t| *t.policy() != policy) {
            return Err("lane tile policy does not match the warp policy");
        }
        Ok(Self { policy, lanes })
    }

    /// Build a warp's accumulators from a function of the warp-tile
    /// coordinate each element maps to.
    ///
    /// ```
    /// use simt_epilogue_core::{SimtPolicy, WarpAccumulators};
    ///
    /// let acc = WarpAccumulators::from_fn(SimtPolicy::WARP_32X64, |c| {
    ///     (c.row * 64 + c.column) as f32
    /// });
    /// assert_eq!(acc.lane(0).as_slice()[0], 0.0);
    /// ```
    pub fn from_fn<F>(policy: SimtPolicy, mut f: F) -> Self
    where
        F: FnMut(MatrixCoord) -> A,
    {
        let lanes = (0..policy.lane_count())
            .map(|lane| {
                let mut data = Vec::with_capacity(policy.accumulator_element_count);
                for iteration in 0..policy.iterations {
                    for element in 0..policy.elements_per_iteration {
                        data.push(f(policy.element_coord(lane, iteration, element)));
                    }
                }
                AccumulatorTile {
                    policy,
                    data: data.into_boxed_slice(),
                }
            })
            .collect();
        Self { policy, lanes }
    }

    /// The policy shared by all lane tiles.
    #[inline]
    pub fn policy(&self) -> &SimtPolicy {
        &self.policy
    }

    /// One lane's accumulator tile.
    #[inline]
    pub fn lane(&self, lane: usize) -> &AccumulatorTile<A> {
        &self.lanes[lane]
    }
}
