use simt_epilogue_core::{EpilogueConfig, OutputOp, ThreadblockEpilogue, WarpAccumulators};
use simt_epilogue_types::{AccumulatorElement, MatrixCoord, TensorMut, TensorRef};

use crate::error::{EpilogueError, Result};

/// Run the full drain-transform-store pass for one output tile.
///
/// Accumulator sets are ordered partition-major: index
/// `k * warps_per_block + m` holds split-K partition `k`'s warp covering
/// row block `m` of the tile. The destination tensor is mutated in place;
/// elements of boundary tiles that fall outside the destination extent are
/// masked, and the bias view (when the functor uses one) is read once per
/// output channel.
///
/// # Example
///
/// ```
/// use simt_epilogue::prelude::*;
///
/// let policy = SimtPolicy::WARP_32X64;
/// let config = EpilogueConfig::new(policy, OutputLayout::RowMajor, 2, 1);
///
/// let warps: Vec<WarpAccumulators<f32>> = (0..2)
///     .map(|m| WarpAccumulators::from_fn(policy, move |c| (m * 32 + c.row) as f32))
///     .collect();
///
/// let mut data = vec![0.0f32; 64 * 64];
/// let mut dst = TensorMut::from_slice(&mut data, MatrixShape::new(64, 64), OutputLayout::RowMajor);
///
/// let op = LinearCombination::<f32, f32>::new(1.0, 0.0);
/// run_epilogue(config, &warps, &op, &mut dst, None, MatrixCoord::new(0, 0))?;
///
/// assert_eq!(data[10 * 64 + 3], 10.0);
/// # Ok::<(), simt_epilogue::EpilogueError>(())
/// ```
pub fn run_epilogue<A, Op>(
    config: EpilogueConfig,
    warps: &[WarpAccumulators<A>],
    output_op: &Op,
    destination: &mut TensorMut<'_, Op::Output>,
    bias: Option<&TensorRef<'_, A>>,
    tile_origin: MatrixCoord,
) -> Result<()>
where
    A: AccumulatorElement,
    Op: OutputOp<A>,
{
    let mut epilogue = Epilogue::new(config)?;
    epilogue.run(warps, output_op, destination, bias, tile_origin)
}

/// Reusable epilogue bound to one configuration.
///
/// Construction validates the configuration and allocates the staging
/// buffer once; `run` may then be invoked for every output tile the
/// kernel produces.
///
/// ```
/// use simt_epilogue::prelude::*;
///
/// let config = EpilogueConfig::new(SimtPolicy::WARP_32X64, OutputLayout::RowMajor, 2, 1);
/// let epilogue = Epilogue::<f32>::new(config)?;
/// assert_eq!(epilogue.config().threadblock_shape(), MatrixShape::new(64, 64));
/// # Ok::<(), simt_epilogue::EpilogueError>(())
/// ```
#[derive(Debug)]
pub struct Epilogue<A> {
    inner: ThreadblockEpilogue<A>,
}

impl<A: AccumulatorElement> Epilogue<A> {
    /// Validate the configuration and allocate the epilogue.
    pub fn new(config: EpilogueConfig) -> Result<Self> {
        let inner = ThreadblockEpilogue::new(config).map_err(EpilogueError::Config)?;
        Ok(Self { inner })
    }

    /// The validated configuration.
    pub fn config(&self) -> &EpilogueConfig {
        self.inner.config()
    }

    /// Run the pass for one output tile. See [`run_epilogue`].
    pub fn run<Op>(
        &mut self,
        warps: &[WarpAccumulators<A>],
        output_op: &Op,
        destination: &mut TensorMut<'_, Op::Output>,
        bias: Option<&TensorRef<'_, A>>,
        tile_origin: MatrixCoord,
    ) -> Result<()>
    where
        Op: OutputOp<A>,
    {
        let config = self.inner.config();
        if warps.len() != config.warp_count() {
            return Err(EpilogueError::WarpCountMismatch {
                expected: config.warp_count(),
                actual: warps.len(),
            });
        }
        if warps.iter().any(|w| *w.policy() != config.policy) {
            return Err(EpilogueError::PolicyMismatch);
        }
        if destination.layout() != config.layout {
            return Err(EpilogueError::LayoutMismatch {
                expected: config.layout,
                actual: destination.layout(),
            });
        }

        self.inner
            .run(warps, output_op, destination, bias, tile_origin);
        Ok(())
    }
}
