use simt_epilogue_types::{MatrixCoord, MatrixShape, OutputLayout};

/// Compile-time tiling policy for the warp-scoped phase of the epilogue.
///
/// Derived once from the warp's output tile shape, the arrangement of lanes
/// within the warp and the lane micro-tile width. All derived quantities are
/// exact: the constructor requires the shapes to divide evenly, so a policy
/// bound to a `const` fails the build when the shapes are inconsistent.
///
/// ```
/// use simt_epilogue_core::SimtPolicy;
/// use simt_epilogue_types::MatrixShape;
///
/// const POLICY: SimtPolicy =
///     SimtPolicy::new(MatrixShape::new(32, 64), MatrixShape::new(4, 8), 4);
///
/// assert_eq!(POLICY.iterations, 8);
/// assert_eq!(POLICY.elements_per_iteration, 8);
/// assert_eq!(POLICY.accumulator_element_count, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimtPolicy {
    /// Shape of the warp-level output tile.
    pub warp_shape: MatrixShape,
    /// Arrangement of lanes within the warp.
    pub lane_shape: MatrixShape,
    /// Number of sequential fragment steps covering the warp's rows.
    pub iterations: usize,
    /// Accumulator elements each lane contributes per iteration.
    pub elements_per_iteration: usize,
    /// Total accumulator length held by one lane.
    pub accumulator_element_count: usize,
    /// Vector width of one staging-buffer access.
    pub elements_per_access: usize,
    /// Output rows covered by one iteration.
    pub rows_per_iteration: usize,
    /// Number of vector accesses per iteration.
    pub accesses_per_iteration: usize,
}

impl SimtPolicy {
    /// Warp tile 32x64 over a 4x8 lane grid with 4-wide lane accesses.
    pub const WARP_32X64: Self =
        Self::new(MatrixShape::new(32, 64), MatrixShape::new(4, 8), 4);

    /// Warp tile 64x64 over an 8x4 lane grid with 4-wide lane accesses.
    pub const WARP_64X64: Self =
        Self::new(MatrixShape::new(64, 64), MatrixShape::new(8, 4), 4);

    /// Derive a policy from the warp tile shape, the lane arrangement and
    /// the lane micro-tile width.
    ///
    /// # Panics
    /// Panics when any dimension fails to divide evenly. Evaluating the
    /// constructor in a `const` context turns this into a build failure.
    pub const fn new(
        warp_shape: MatrixShape,
        lane_shape: MatrixShape,
        lane_mma_width: usize,
    ) -> Self {
        assert!(lane_shape.row > 0 && lane_shape.column > 0, "lane shape must be non-zero");
        assert!(lane_mma_width > 0, "lane micro-tile width must be non-zero");
        assert!(
            warp_shape.row % lane_shape.row == 0,
            "warp rows must be divisible by lane rows"
        );
        assert!(
            warp_shape.column % lane_shape.column == 0,
            "warp columns must be divisible by lane columns"
        );

        let iterations = warp_shape.row / lane_shape.row;
        let elements_per_iteration = warp_shape.column / lane_shape.column;
        assert!(
            elements_per_iteration % lane_mma_width == 0,
            "per-iteration elements must be divisible by the lane micro-tile width"
        );

        Self {
            warp_shape,
            lane_shape,
            iterations,
            elements_per_iteration,
            accumulator_element_count: iterations * elements_per_iteration,
            elements_per_access: lane_mma_width,
            rows_per_iteration: lane_shape.row,
            accesses_per_iteration: elements_per_iteration / lane_mma_width,
        }
    }

    /// Fallible constructor for configuration-driven policy selection.
    pub fn try_new(
        warp_shape: MatrixShape,
        lane_shape: MatrixShape,
        lane_mma_width: usize,
    ) -> Result<Self, &'static str> {
        if lane_shape.row == 0 || lane_shape.column == 0 {
            return Err("lane shape must be non-zero");
        }
        if lane_mma_width == 0 {
            return Err("lane micro-tile width must be non-zero");
        }
        if !warp_shape.row.is_multiple_of(lane_shape.row) {
            return Err("warp rows must be divisible by lane rows");
        }
        if !warp_shape.column.is_multiple_of(lane_shape.column) {
            return Err("warp columns must be divisible by lane columns");
        }
        if !(warp_shape.column / lane_shape.column).is_multiple_of(lane_mma_width) {
            return Err("per-iteration elements must be divisible by the lane micro-tile width");
        }
        Ok(Self::new(warp_shape, lane_shape, lane_mma_width))
    }

    /// Derive a policy and check it against a destination layout.
    ///
    /// Interleaved destinations additionally require the interleave factor
    /// to divide the warp columns and to be a multiple of the access width,
    /// so that one vector access never straddles a channel group.
    pub fn for_layout(
        layout: OutputLayout,
        warp_shape: MatrixShape,
        lane_shape: MatrixShape,
        lane_mma_width: usize,
    ) -> Result<Self, &'static str> {
        let policy = Self::try_new(warp_shape, lane_shape, lane_mma_width)?;
        policy.check_layout(layout)?;
        Ok(policy)
    }

    /// Check layout-specific divisibility constraints.
    pub fn check_layout(&self, layout: OutputLayout) -> Result<(), &'static str> {
        if let OutputLayout::ChannelInterleaved { factor } = layout {
            if factor == 0 {
                return Err("interleave factor must be non-zero");
            }
            if !self.warp_shape.column.is_multiple_of(factor) {
                return Err("warp columns must be divisible by the interleave factor");
            }
            if !factor.is_multiple_of(self.elements_per_access) {
                return Err("interleave factor must be a multiple of the access width");
            }
        }
        Ok(())
    }

    /// Number of lanes in the warp.
    #[inline]
    pub const fn lane_count(&self) -> usize {
        self.lane_shape.count()
    }

    /// Position within the warp tile of one accumulator element.
    ///
    /// `lane` indexes the lane grid row-major; `element` indexes the lane's
    /// per-iteration elements. Lanes cover the tile columns at access
    /// granularity, strided by the lane-column count.
    pub fn element_coord(&self, lane: usize, iteration: usize, element: usize) -> MatrixCoord {
        debug_assert!(lane < self.lane_count(), "lane index out of range");
        debug_assert!(iteration < self.iterations, "iteration index out of range");
        debug_assert!(
            element < self.elements_per_iteration,
            "element index out of range"
        );

        let lane_row = lane / self.lane_shape.column;
        let lane_column = lane % self.lane_shape.column;
        let access = element / self.elements_per_access;
        let within = element % self.elements_per_access;

        MatrixCoord::new(
            iteration * self.rows_per_iteration + lane_row,
            lane_column * self.elements_per_access
                + access * self.lane_shape.column * self.elements_per_access
                + within,
        )
    }
}
