//! Numeric element types a [SegmentTree](crate::SegmentTree) can hold.

use std::fmt::Debug;

use common::{StreeError, StreeResult};
use num::{NumCast, Zero};

/// A numeric type usable as tree element.
/// Besides ordering and a zero for empty sums it has to provide an addition
/// which reports leaving its range instead of wrapping around.
pub trait Element: Copy + PartialOrd + Debug + Zero + NumCast {
    /// The type range queries accumulate in.
    /// Partial sums of a query may leave the range of `Self` even if the result does not,
    /// so integers accumulate in the next wider type. 128 bit integers and floats use themselves.
    type Wide: Element;

    /// Adds two elements. Returns `None` if the result is not representable.
    fn checked_sum(self, other: Self) -> Option<Self>;

    /// Converts into [Wide](Element::Wide) without loss.
    fn widen(self) -> Self::Wide;
}

macro_rules! implement_checked_element {
    ($($type:ty => $wide:ty),*) => {
        $(
            impl Element for $type {
                type Wide = $wide;

                #[inline]
                fn checked_sum(self, other: Self) -> Option<Self> {
                    self.checked_add(other)
                }

                #[inline]
                fn widen(self) -> $wide {
                    self as $wide
                }
            }
        )*
    };
}
implement_checked_element!(
    i8 => i16, i16 => i32, i32 => i64, i64 => i128, i128 => i128, isize => i128,
    u8 => u16, u16 => u32, u32 => u64, u64 => u128, u128 => u128, usize => u128
);

macro_rules! implement_float_element {
    ($($type:ty),*) => {
        $(
            impl Element for $type {
                type Wide = $type;

                // Floats saturate to infinity, which is not an overflow in the integer sense.
                #[inline]
                fn checked_sum(self, other: Self) -> Option<Self> {
                    Some(self + other)
                }

                #[inline]
                fn widen(self) -> $type {
                    self
                }
            }
        )*
    };
}
implement_float_element!(f32, f64);

/// Converts `value` into the element type `T`.
/// The conversion has to be lossless, that is converting the result back has to give `value` again.
/// NaN converts into float types as NaN.
/// # Errors
/// A [StreeError::ConversionError] if `value` can not be represented exactly in `T`.
/// # Example
/// ```
/// # use segment_tree::convert;
/// assert_eq!(convert::<f64, i64>(3.0).unwrap(), 3);
/// assert!(convert::<f64, i64>(10.5).is_err());
/// assert!(convert::<i64, u8>(256).is_err());
/// ```
pub fn convert<I, T>(value: I) -> StreeResult<T>
where
    I: NumCast + PartialEq + Copy + Debug,
    T: Element,
{
    match <T as NumCast>::from(value) {
        Some(converted) if round_trips(value, converted) => Ok(converted),
        _ => Err(StreeError::ConversionError(format!(
            "{:?} can not be represented as {}",
            value,
            std::any::type_name::<T>()
        ))),
    }
}

#[allow(clippy::eq_op)]
fn round_trips<I, T>(value: I, converted: T) -> bool
where
    I: NumCast + PartialEq + Copy,
    T: Element,
{
    // NaN is the only value unequal to itself
    let is_nan = value != value;
    is_nan || <I as NumCast>::from(converted) == Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sum_detects_integer_overflow() {
        assert_eq!(i64::MAX.checked_sum(1), None);
        assert_eq!(i64::MIN.checked_sum(-1), None);
        assert_eq!(40i64.checked_sum(2), Some(42));
        assert_eq!(u8::MAX.checked_sum(0), Some(u8::MAX));
    }

    #[test]
    fn widening_keeps_the_value() {
        assert_eq!(i64::MAX.widen(), i64::MAX as i128);
        assert_eq!(i64::MIN.widen() - 1, -(1i128 << 63) - 1);
        assert_eq!(u64::MAX.widen() + 1, 1u128 << 64);
        assert_eq!((-3i32).widen(), -3i64);
        assert_eq!(i128::MAX.widen(), i128::MAX);
        assert_eq!(0.5f64.widen(), 0.5);
    }

    #[test]
    fn float_sums_never_fail() {
        assert_eq!(f64::MAX.checked_sum(f64::MAX), Some(f64::INFINITY));
        assert_eq!(1.5f64.checked_sum(2.25), Some(3.75));
    }

    #[test]
    fn conversion_between_integers_checks_width() {
        assert_eq!(convert::<i64, i32>(-7).unwrap(), -7i32);
        assert!(convert::<i64, i32>(<i64 as From<i32>>::from(i32::MAX) + 1).is_err());
        assert!(convert::<i64, u64>(-1).is_err());
        assert!(convert::<u64, i64>(u64::MAX).is_err());
    }

    #[test]
    fn conversion_into_integers_rejects_fractions() {
        assert!(matches!(
            convert::<f64, i64>(10.5),
            Err(StreeError::ConversionError(_))
        ));
        assert!(convert::<f64, i64>(f64::NAN).is_err());
        assert!(convert::<f64, i64>(f64::INFINITY).is_err());
        assert_eq!(convert::<f64, i64>(-4.0).unwrap(), -4);
    }

    #[test]
    fn conversion_into_floats_has_to_be_exact() {
        assert_eq!(convert::<i64, f64>(2).unwrap(), 2.0);
        assert_eq!(convert::<i64, f64>(1 << 53).unwrap(), 9007199254740992.0);
        assert!(convert::<i64, f64>((1 << 53) + 1).is_err());
        assert!(convert::<f64, f64>(f64::NAN).unwrap().is_nan());
        assert_eq!(convert::<f64, f64>(f64::INFINITY).unwrap(), f64::INFINITY);
    }
}
