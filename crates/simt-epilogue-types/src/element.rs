use std::fmt::Debug;

/// Trait for numeric types usable as epilogue accumulator elements.
///
/// Accumulators are produced by the compute stage and flow through the
/// staging buffer unchanged; the epilogue only needs identity values,
/// addition (for split-K reduction) and multiplication (for scaling).
pub trait AccumulatorElement:
    Copy + Clone + Send + Sync + Debug + PartialEq + PartialOrd + 'static
{
    /// The additive identity.
    fn accum_zero() -> Self;

    /// The multiplicative identity.
    fn accum_one() -> Self;

    /// Standard arithmetic addition.
    fn accum_add(self, rhs: Self) -> Self;

    /// Standard arithmetic multiplication.
    fn accum_mul(self, rhs: Self) -> Self;
}

macro_rules! impl_accumulator_float {
    ($($t:ty),*) => {
        $(
            impl AccumulatorElement for $t {
                #[inline(always)]
                fn accum_zero() -> Self {
                    0.0
                }

                #[inline(always)]
                fn accum_one() -> Self {
                    1.0
                }

                #[inline(always)]
                fn accum_add(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline(always)]
                fn accum_mul(self, rhs: Self) -> Self {
                    self * rhs
                }
            }
        )*
    };
}

macro_rules! impl_accumulator_int {
    ($($t:ty),*) => {
        $(
            impl AccumulatorElement for $t {
                #[inline(always)]
                fn accum_zero() -> Self {
                    0
                }

                #[inline(always)]
                fn accum_one() -> Self {
                    1
                }

                #[inline(always)]
                fn accum_add(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline(always)]
                fn accum_mul(self, rhs: Self) -> Self {
                    self * rhs
                }
            }
        )*
    };
}

impl_accumulator_float!(f32, f64);
impl_accumulator_int!(i32, i64);

/// Conversion from an accumulator type into a (usually narrower) output
/// element type.
///
/// Conversions round to nearest and saturate at the bounds of the target
/// type, matching the behavior of hardware conversion instructions.
pub trait FromAccumulator<A: AccumulatorElement>:
    Copy + Clone + Send + Sync + Debug + PartialEq + 'static
{
    /// Convert an accumulator value into the output representation.
    fn from_accumulator(value: A) -> Self;
}

macro_rules! impl_identity_conversion {
    ($($t:ty),*) => {
        $(
            impl FromAccumulator<$t> for $t {
                #[inline(always)]
                fn from_accumulator(value: $t) -> Self {
                    value
                }
            }
        )*
    };
}

impl_identity_conversion!(f32, f64, i32, i64);

macro_rules! impl_float_to_int_conversion {
    ($from:ty => $($to:ty),*) => {
        $(
            impl FromAccumulator<$from> for $to {
                #[inline(always)]
                fn from_accumulator(value: $from) -> Self {
                    // `as` casts from float saturate at the integer bounds
                    // and map NaN to zero.
                    value.round() as $to
                }
            }
        )*
    };
}

impl_float_to_int_conversion!(f32 => u8, i8, i32);
impl_float_to_int_conversion!(f64 => u8, i8, i32);

macro_rules! impl_int_to_int_conversion {
    ($from:ty => $($to:ty),*) => {
        $(
            impl FromAccumulator<$from> for $to {
                #[inline(always)]
                fn from_accumulator(value: $from) -> Self {
                    let clamped = value
                        .max(<$to>::MIN as $from)
                        .min(<$to>::MAX as $from);
                    clamped as $to
                }
            }
        )*
    };
}

impl_int_to_int_conversion!(i32 => u8, i8);
impl_int_to_int_conversion!(i64 => u8, i8, i32);

impl FromAccumulator<f32> for f64 {
    #[inline(always)]
    fn from_accumulator(value: f32) -> Self {
        value as f64
    }
}

impl FromAccumulator<f64> for f32 {
    #[inline(always)]
    fn from_accumulator(value: f64) -> Self {
        value as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_conversion() {
        assert_eq!(<f32 as FromAccumulator<f32>>::from_accumulator(1.5), 1.5);
        assert_eq!(<i32 as FromAccumulator<i32>>::from_accumulator(-7), -7);
    }

    #[test]
    fn test_float_to_u8_saturates() {
        assert_eq!(<u8 as FromAccumulator<f32>>::from_accumulator(-5.0), 0);
        assert_eq!(<u8 as FromAccumulator<f32>>::from_accumulator(300.0), 255);
        assert_eq!(<u8 as FromAccumulator<f32>>::from_accumulator(127.4), 127);
        assert_eq!(<u8 as FromAccumulator<f32>>::from_accumulator(127.6), 128);
    }

    #[test]
    fn test_float_to_i8_saturates() {
        assert_eq!(<i8 as FromAccumulator<f32>>::from_accumulator(-200.0), -128);
        assert_eq!(<i8 as FromAccumulator<f32>>::from_accumulator(200.0), 127);
        assert_eq!(<i8 as FromAccumulator<f32>>::from_accumulator(-1.5), -2);
    }

    #[test]
    fn test_int_to_int_saturates() {
        assert_eq!(<u8 as FromAccumulator<i32>>::from_accumulator(-1), 0);
        assert_eq!(<u8 as FromAccumulator<i32>>::from_accumulator(999), 255);
        assert_eq!(<i8 as FromAccumulator<i32>>::from_accumulator(-129), -128);
    }

    #[test]
    fn test_accumulator_identities() {
        assert_eq!(f32::accum_zero(), 0.0);
        assert_eq!(f32::accum_one(), 1.0);
        assert_eq!(2.0f32.accum_add(3.0), 5.0);
        assert_eq!(2.0f32.accum_mul(3.0), 6.0);
        assert_eq!(i32::accum_zero(), 0);
        assert_eq!(4i32.accum_mul(5), 20);
    }
}
