//! Predicated iterators over the destination and bias tensors.

use simt_epilogue_types::{AccumulatorElement, MatrixCoord, TensorMut, TensorRef};

/// Boundary-aware store iterator for the destination tensor.
///
/// Bound to a tile origin; stores take coordinates relative to the tile and
/// are masked (silently skipped) when the absolute coordinate falls outside
/// the tensor's logical extent, which is what happens for tiles at the
/// tensor boundary.
#[derive(Debug)]
pub struct OutputTileIterator<'a, 'd, T> {
    tensor: &'a mut TensorMut<'d, T>,
    origin: MatrixCoord,
}

impl<'a, 'd, T: Copy> OutputTileIterator<'a, 'd, T> {
    /// Bind the iterator to a destination view and tile origin.
    pub fn new(tensor: &'a mut TensorMut<'d, T>, origin: MatrixCoord) -> Self {
        Self { tensor, origin }
    }

    /// Predicated store of one element at a tile-relative coordinate.
    /// Returns whether the element was in bounds.
    #[inline]
    pub fn store(&mut self, in_tile: MatrixCoord, value: T) -> bool {
        let coord = self.origin.offset(in_tile);
        self.tensor.set(coord.row, coord.column, value)
    }
}

/// Per-channel bias reader.
///
/// The bias tensor holds one value per output channel; the epilogue reads
/// the tile's channel range once and reuses it for every row. Channels
/// outside the bias extent yield the additive identity, which only pairs
/// with output elements that are themselves masked.
#[derive(Debug, Clone, Copy)]
pub struct BiasTileIterator<'a, 'd, A> {
    view: Option<&'a TensorRef<'d, A>>,
    origin_column: usize,
}

impl<'a, 'd, A: AccumulatorElement> BiasTileIterator<'a, 'd, A> {
    /// Bind the iterator to an optional bias view and the tile's first
    /// channel.
    pub fn new(view: Option<&'a TensorRef<'d, A>>, origin_column: usize) -> Self {
        Self {
            view,
            origin_column,
        }
    }

    /// Read `count` consecutive channel bias values starting at the tile
    /// origin.
    pub fn load_channels(&self, count: usize) -> Vec<A> {
        match self.view {
            None => vec![A::accum_zero(); count],
            Some(view) => (0..count)
                .map(|i| {
                    view.get(0, self.origin_column + i)
                        .unwrap_or_else(A::accum_zero)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simt_epilogue_types::{MatrixShape, OutputLayout};

    #[test]
    fn test_store_masks_boundary_elements() {
        let mut data = vec![0.0f32; 3 * 2];
        let mut dst =
            TensorMut::from_slice(&mut data, MatrixShape::new(3, 2), OutputLayout::RowMajor);
        let mut iter = OutputTileIterator::new(&mut dst, MatrixCoord::new(2, 0));

        // Tile row 0 lands on tensor row 2 (last valid row).
        assert!(iter.store(MatrixCoord::new(0, 0), 1.0));
        assert!(iter.store(MatrixCoord::new(0, 1), 2.0));
        // Tile row 1 is past the extent; column 2 likewise.
        assert!(!iter.store(MatrixCoord::new(1, 0), 3.0));
        assert!(!iter.store(MatrixCoord::new(0, 2), 4.0));

        assert_eq!(data, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_bias_channels_with_view() {
        let bias = [1.0f32, -1.0, 0.5, 0.0];
        let view = TensorRef::from_slice(&bias, MatrixShape::new(1, 4), OutputLayout::RowMajor);

        let iter = BiasTileIterator::new(Some(&view), 1);
        assert_eq!(iter.load_channels(2), vec![-1.0, 0.5]);

        // Reading past the bias extent yields identities.
        let tail = BiasTileIterator::new(Some(&view), 3);
        assert_eq!(tail.load_channels(3), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bias_channels_without_view() {
        let iter = BiasTileIterator::<f32>::new(None, 0);
        assert_eq!(iter.load_channels(3), vec![0.0, 0.0, 0.0]);
    }
}
