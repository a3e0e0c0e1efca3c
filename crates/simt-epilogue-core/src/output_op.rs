//! Thread-level output functors.
//!
//! A functor turns one gathered accumulator value into one final output
//! element: scale, per-channel bias add, optional clamp and numeric
//! conversion happen in a single pass. Functors are plain value objects;
//! the epilogue never mutates them.

use std::marker::PhantomData;

use simt_epilogue_types::{AccumulatorElement, FromAccumulator};

/// Elementwise transform applied between the gather and store phases.
pub trait OutputOp<A: AccumulatorElement> {
    /// Final element type written to the destination tensor.
    type Output: FromAccumulator<A>;

    /// Whether the epilogue needs to read the bias tensor at all.
    fn is_bias_needed(&self) -> bool;

    /// Transform one accumulator value; `bias` is the per-channel bias for
    /// the element's output channel (the additive identity when no bias
    /// tensor is bound).
    fn apply(&self, accumulator: A, bias: A) -> Self::Output;
}

/// `output = convert(alpha * accumulator + beta * bias)`.
#[derive(Debug, Clone, Copy)]
pub struct LinearCombination<A, O> {
    /// Scale applied to the accumulator.
    pub alpha: A,
    /// Scale applied to the bias value.
    pub beta: A,
    _output: PhantomData<O>,
}

impl<A: AccumulatorElement, O> LinearCombination<A, O> {
    /// Create the functor from its coefficients.
    pub fn new(alpha: A, beta: A) -> Self {
        Self {
            alpha,
            beta,
            _output: PhantomData,
        }
    }
}

impl<A, O> OutputOp<A> for LinearCombination<A, O>
where
    A: AccumulatorElement,
    O: FromAccumulator<A>,
{
    type Output = O;

    #[inline]
    fn is_bias_needed(&self) -> bool {
        self.beta != A::accum_zero()
    }

    #[inline]
    fn apply(&self, accumulator: A, bias: A) -> O {
        O::from_accumulator(
            self.alpha
                .accum_mul(accumulator)
                .accum_add(self.beta.accum_mul(bias)),
        )
    }
}

/// `output = convert(clamp(alpha * accumulator + beta * bias))`.
///
/// The clamp bounds are expressed in the accumulator domain, before
/// conversion; conversion itself still saturates at the output type's
/// range.
#[derive(Debug, Clone, Copy)]
pub struct LinearCombinationClamp<A, O> {
    /// Scale applied to the accumulator.
    pub alpha: A,
    /// Scale applied to the bias value.
    pub beta: A,
    /// Lower clamp bound.
    pub min: A,
    /// Upper clamp bound.
    pub max: A,
    _output: PhantomData<O>,
}

impl<A: AccumulatorElement, O> LinearCombinationClamp<A, O> {
    /// Create the functor from its coefficients and clamp bounds.
    pub fn new(alpha: A, beta: A, min: A, max: A) -> Self {
        Self {
            alpha,
            beta,
            min,
            max,
            _output: PhantomData,
        }
    }
}

impl<A, O> OutputOp<A> for LinearCombinationClamp<A, O>
where
    A: AccumulatorElement,
    O: FromAccumulator<A>,
{
    type Output = O;

    #[inline]
    fn is_bias_needed(&self) -> bool {
        self.beta != A::accum_zero()
    }

    #[inline]
    fn apply(&self, accumulator: A, bias: A) -> O {
        let mut value = self
            .alpha
            .accum_mul(accumulator)
            .accum_add(self.beta.accum_mul(bias));
        if value < self.min {
            value = self.min;
        }
        if value > self.max {
            value = self.max;
        }
        O::from_accumulator(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_combination_scales_and_biases() {
        let op = LinearCombination::<f32, f32>::new(2.0, 1.0);
        assert_eq!(op.apply(3.0, 0.5), 6.5);
        assert!(op.is_bias_needed());

        let no_bias = LinearCombination::<f32, f32>::new(1.0, 0.0);
        assert!(!no_bias.is_bias_needed());
        assert_eq!(no_bias.apply(3.0, 99.0), 3.0);
    }

    #[test]
    fn test_clamp_bounds() {
        let op = LinearCombinationClamp::<f32, f32>::new(1.0, 0.0, -1.0, 1.0);
        assert_eq!(op.apply(0.5, 0.0), 0.5);
        assert_eq!(op.apply(5.0, 0.0), 1.0);
        assert_eq!(op.apply(-5.0, 0.0), -1.0);
    }

    #[test]
    fn test_clamp_and_convert_to_u8() {
        let op = LinearCombinationClamp::<f32, u8>::new(1.0, 0.0, 0.0, 255.0);
        assert_eq!(op.apply(-5.0, 0.0), 0);
        assert_eq!(op.apply(300.0, 0.0), 255);
        assert_eq!(op.apply(17.3, 0.0), 17);
    }

    #[test]
    fn test_integer_combination() {
        let op = LinearCombination::<i32, i8>::new(1, 1);
        assert_eq!(op.apply(100, 50), 127); // saturating conversion
        assert_eq!(op.apply(10, -20), -10);
    }
}
