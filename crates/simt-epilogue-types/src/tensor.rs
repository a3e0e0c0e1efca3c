//! Predicated tensor view types.
//!
//! These are lightweight views over caller-owned storage. Every access is
//! checked against the logical extent: out-of-range reads yield `None` and
//! out-of-range writes are skipped, which is what makes boundary tiles safe
//! without any runtime error path.

use crate::layout::OutputLayout;
use crate::shape::MatrixShape;

/// Compute the linear offset of `(row, column)` under `layout`, or `None`
/// when the coordinate lies outside `extent`.
///
/// # Layout
/// For `ChannelInterleaved { factor: 4 }` and an extent of (rows, 8):
/// ```text
/// offset(r, c) = (c / 4) * rows * 4 + r * 4 + c % 4
///
/// group 0 (c = 0..4): all rows, channels 0-3 packed per row
/// group 1 (c = 4..8): all rows, channels 4-7 packed per row
/// ```
fn linear_offset(
    extent: MatrixShape,
    layout: OutputLayout,
    row: usize,
    column: usize,
) -> Option<usize> {
    if row >= extent.row || column >= extent.column {
        return None;
    }
    let offset = match layout {
        OutputLayout::RowMajor => row * extent.column + column,
        OutputLayout::ChannelInterleaved { factor } => {
            (column / factor) * extent.row * factor + row * factor + column % factor
        }
    };
    Some(offset)
}

fn check_extent(len: usize, extent: MatrixShape, layout: OutputLayout) {
    assert_eq!(
        len,
        extent.count(),
        "data length {} != extent {}x{}",
        len,
        extent.row,
        extent.column
    );
    let factor = layout.interleave_factor();
    assert!(
        extent.column % factor == 0,
        "extent columns {} not divisible by interleave factor {}",
        extent.column,
        factor
    );
}

/// Immutable view over tensor data with a logical extent and layout.
///
/// ```
/// use simt_epilogue_types::{MatrixShape, OutputLayout, TensorRef};
///
/// let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let t = TensorRef::from_slice(&data, MatrixShape::new(2, 3), OutputLayout::RowMajor);
///
/// assert_eq!(t.get(1, 2), Some(6.0));
/// assert_eq!(t.get(2, 0), None);
/// ```
#[derive(Debug)]
pub struct TensorRef<'a, T> {
    data: &'a [T],
    extent: MatrixShape,
    layout: OutputLayout,
}

impl<'a, T> Copy for TensorRef<'a, T> {}

impl<'a, T> Clone for TensorRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Copy> TensorRef<'a, T> {
    /// Create a view from a slice.
    ///
    /// # Panics
    /// Panics if the slice length does not match the extent, or if the
    /// extent is incompatible with the layout's interleave factor.
    pub fn from_slice(data: &'a [T], extent: MatrixShape, layout: OutputLayout) -> Self {
        check_extent(data.len(), extent, layout);
        Self {
            data,
            extent,
            layout,
        }
    }

    /// Logical extent of the tensor.
    #[inline]
    pub fn extent(&self) -> MatrixShape {
        self.extent
    }

    /// Layout tag of the tensor.
    #[inline]
    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Underlying storage.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data
    }

    /// Whether a coordinate lies within the logical extent.
    #[inline]
    pub fn contains(&self, row: usize, column: usize) -> bool {
        row < self.extent.row && column < self.extent.column
    }

    /// Predicated read: `None` when the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<T> {
        linear_offset(self.extent, self.layout, row, column).map(|i| self.data[i])
    }
}

/// Mutable view over tensor data with a logical extent and layout.
#[derive(Debug)]
pub struct TensorMut<'a, T> {
    data: &'a mut [T],
    extent: MatrixShape,
    layout: OutputLayout,
}

impl<'a, T: Copy> TensorMut<'a, T> {
    /// Create a mutable view from a slice.
    ///
    /// # Panics
    /// Panics if the slice length does not match the extent, or if the
    /// extent is incompatible with the layout's interleave factor.
    pub fn from_slice(data: &'a mut [T], extent: MatrixShape, layout: OutputLayout) -> Self {
        check_extent(data.len(), extent, layout);
        Self {
            data,
            extent,
            layout,
        }
    }

    /// Logical extent of the tensor.
    #[inline]
    pub fn extent(&self) -> MatrixShape {
        self.extent
    }

    /// Layout tag of the tensor.
    #[inline]
    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Underlying storage.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data
    }

    /// Predicated read: `None` when the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<T> {
        linear_offset(self.extent, self.layout, row, column).map(|i| self.data[i])
    }

    /// Predicated write. Out-of-range coordinates are masked: the write is
    /// skipped and `false` is returned.
    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: T) -> bool {
        match linear_offset(self.extent, self.layout, row, column) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Reborrow as an immutable view.
    pub fn as_ref(&self) -> TensorRef<'_, T> {
        TensorRef {
            data: self.data,
            extent: self.extent,
            layout: self.layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_offsets() {
        let extent = MatrixShape::new(2, 3);
        assert_eq!(linear_offset(extent, OutputLayout::RowMajor, 0, 0), Some(0));
        assert_eq!(linear_offset(extent, OutputLayout::RowMajor, 1, 2), Some(5));
        assert_eq!(linear_offset(extent, OutputLayout::RowMajor, 2, 0), None);
        assert_eq!(linear_offset(extent, OutputLayout::RowMajor, 0, 3), None);
    }

    #[test]
    fn test_interleaved_offsets() {
        // 2 rows, 8 channels, packed in groups of 4.
        let extent = MatrixShape::new(2, 8);
        let layout = OutputLayout::ChannelInterleaved { factor: 4 };

        // Group 0, row 0, channels 0-3 are the first four slots.
        assert_eq!(linear_offset(extent, layout, 0, 0), Some(0));
        assert_eq!(linear_offset(extent, layout, 0, 3), Some(3));
        // Row 1 of group 0 follows row 0.
        assert_eq!(linear_offset(extent, layout, 1, 0), Some(4));
        // Group 1 starts after all rows of group 0.
        assert_eq!(linear_offset(extent, layout, 0, 4), Some(8));
        assert_eq!(linear_offset(extent, layout, 1, 7), Some(15));
    }

    #[test]
    fn test_interleaved_offsets_are_a_bijection() {
        let extent = MatrixShape::new(3, 8);
        let layout = OutputLayout::ChannelInterleaved { factor: 4 };

        let mut seen = vec![false; extent.count()];
        for r in 0..extent.row {
            for c in 0..extent.column {
                let i = linear_offset(extent, layout, r, c).unwrap();
                assert!(!seen[i], "offset {} hit twice", i);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_predicated_set_masks_out_of_range() {
        let mut data = vec![0i32; 6];
        let mut t = TensorMut::from_slice(&mut data, MatrixShape::new(2, 3), OutputLayout::RowMajor);

        assert!(t.set(1, 1, 42));
        assert!(!t.set(2, 0, 7));
        assert!(!t.set(0, 3, 7));

        assert_eq!(t.get(1, 1), Some(42));
        assert_eq!(t.as_slice(), &[0, 0, 0, 0, 42, 0]);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_extent_mismatch_panics() {
        let data = [0.0f32; 5];
        let _ = TensorRef::from_slice(&data, MatrixShape::new(2, 3), OutputLayout::RowMajor);
    }

    #[test]
    #[should_panic(expected = "interleave factor")]
    fn test_interleave_divisibility_panics() {
        let data = [0.0f32; 12];
        let _ = TensorRef::from_slice(
            &data,
            MatrixShape::new(2, 6),
            OutputLayout::ChannelInterleaved { factor: 4 },
        );
    }

    #[test]
    fn test_as_ref_roundtrip() {
        let mut data = vec![1.0f32, 2.0, 3.0, 4.0];
        let mut t = TensorMut::from_slice(&mut data, MatrixShape::new(2, 2), OutputLayout::RowMajor);
        t.set(0, 1, 9.0);
        let r = t.as_ref();
        assert_eq!(r.get(0, 1), Some(9.0));
    }
}
