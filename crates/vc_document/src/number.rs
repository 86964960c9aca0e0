use core::fmt;

// 2^63 and 2^64, exactly representable as `f64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

// -----------------------------------------------------------------------------
// Number

/// Payload of [`Document::Number`](crate::Document::Number).
///
/// Integers keep their exact value. Equality is numeric, so `Int(3)` equals
/// `Float(3.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    /// Only used for values above `i64::MAX`.
    UInt(u64),
    Float(f64),
}

impl Number {
    /// Returns the value as `i64` if it is an integer in range.
    ///
    /// Floats convert only when they have no fractional part.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => i64::try_from(v).ok(),
            Self::Float(v) => {
                if v >= -I64_BOUND && v < I64_BOUND && (v as i64) as f64 == v {
                    Some(v as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer in range.
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::Int(v) => u64::try_from(v).ok(),
            Self::UInt(v) => Some(v),
            Self::Float(v) => {
                if v >= 0.0 && v < U64_BOUND && (v as u64) as f64 == v {
                    Some(v as u64)
                } else {
                    None
                }
            }
        }
    }

    /// Returns the value as `f64`, possibly losing precision.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::UInt(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Float(_), _) | (_, Self::Float(_)) => self.as_f64() == other.as_f64(),
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Int(a), Self::UInt(b)) | (Self::UInt(b), Self::Int(a)) => {
                i128::from(a) == i128::from(b)
            }
        }
    }
}

impl From<i64> for Number {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Number {
    #[inline]
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::UInt(value),
        }
    }
}

impl From<f64> for Number {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => fmt::Display::fmt(v, f),
            Self::UInt(v) => fmt::Display::fmt(v, f),
            Self::Float(v) => fmt::Display::fmt(v, f),
        }
    }
}
