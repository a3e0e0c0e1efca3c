/// A two-dimensional extent in (row, column) order.
///
/// Used for warp tile shapes, lane arrangements and tensor extents alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixShape {
    /// Number of rows.
    pub row: usize,
    /// Number of columns.
    pub column: usize,
}

impl MatrixShape {
    /// Create a shape from row and column extents.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Total number of elements covered by the shape.
    pub const fn count(&self) -> usize {
        self.row * self.column
    }
}

/// A logical (row, column) coordinate within a tensor or tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCoord {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub column: usize,
}

impl MatrixCoord {
    /// Create a coordinate.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Coordinate displaced by another coordinate treated as an offset.
    pub const fn offset(&self, delta: MatrixCoord) -> Self {
        Self {
            row: self.row + delta.row,
            column: self.column + delta.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_count() {
        assert_eq!(MatrixShape::new(4, 8).count(), 32);
        assert_eq!(MatrixShape::new(0, 8).count(), 0);
    }

    #[test]
    fn test_coord_offset() {
        let origin = MatrixCoord::new(64, 128);
        let c = origin.offset(MatrixCoord::new(3, 5));
        assert_eq!(c, MatrixCoord::new(67, 133));
    }

    #[test]
    fn test_shape_eq() {
        assert_eq!(MatrixShape::new(4, 8), MatrixShape::new(4, 8));
        assert_ne!(MatrixShape::new(4, 8), MatrixShape::new(8, 4));
    }
}
