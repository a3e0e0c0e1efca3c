/// Destination memory layout for the output tensor.
///
/// The epilogue supports a closed set of layout strategies; every component
/// that is layout-sensitive (staging interleave rule, tensor addressing)
/// matches on this tag rather than being specialized per layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// Plain row-major layout (C-style).
    RowMajor,
    /// Channel-packed layout: columns (output channels) are grouped in
    /// blocks of `factor`, and each group is stored row-major with the
    /// channel remainder innermost. This is the matrix rendition of
    /// NC/xHWx-style tensors.
    ChannelInterleaved {
        /// Number of channels packed together.
        factor: usize,
    },
}

impl OutputLayout {
    /// The channel interleave factor; 1 for row-major.
    pub const fn interleave_factor(&self) -> usize {
        match self {
            OutputLayout::RowMajor => 1,
            OutputLayout::ChannelInterleaved { factor } => *factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_factor() {
        assert_eq!(OutputLayout::RowMajor.interleave_factor(), 1);
        assert_eq!(
            OutputLayout::ChannelInterleaved { factor: 4 }.interleave_factor(),
            4
        );
    }

    #[test]
    fn test_layout_eq() {
        assert_eq!(
            OutputLayout::ChannelInterleaved { factor: 4 },
            OutputLayout::ChannelInterleaved { factor: 4 }
        );
        assert_ne!(
            OutputLayout::ChannelInterleaved { factor: 4 },
            OutputLayout::ChannelInterleaved { factor: 32 }
        );
        assert_ne!(
            OutputLayout::RowMajor,
            OutputLayout::ChannelInterleaved { factor: 1 }
        );
    }
}
