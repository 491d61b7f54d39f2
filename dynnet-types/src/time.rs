use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A point on the real time line.
///
/// `Time` wraps an `f64` that is never NaN, which makes it totally ordered.
/// Both infinities are valid and are used for unbounded interval endpoints.
///
/// # Examples
///
/// ```
/// use dynnet_types::time::Time;
///
/// assert!(Time::new(f64::NAN).is_none());
/// let t = Time::new(1.0).unwrap();
/// assert!(t.is_finite());
/// assert!(!Time::INFINITY.is_finite());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "TimeRepr", into = "TimeRepr")]
pub struct Time(f64);

/// Wire form of [`Time`]. JSON has no infinities, so they travel as the
/// strings `"-inf"` and `"inf"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TimeRepr {
    Number(f64),
    Label(String),
}

impl Time {
    pub const NEG_INFINITY: Time = Time(f64::NEG_INFINITY);
    pub const INFINITY: Time = Time(f64::INFINITY);
    pub const ZERO: Time = Time(0.0);

    /// Create a time value, rejecting NaN.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            // -0.0 and 0.0 must compare equal under total_cmp
            Some(Self(if value == 0.0 { 0.0 } else { value }))
        }
    }

    /// The raw value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    #[inline]
    pub fn is_neg_infinity(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    #[inline]
    pub fn is_pos_infinity(self) -> bool {
        self.0 == f64::INFINITY
    }

    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Time {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for Time {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Time::new(value).ok_or_else(|| "time value must not be NaN".to_string())
    }
}

impl From<Time> for f64 {
    fn from(time: Time) -> Self {
        time.0
    }
}

impl TryFrom<TimeRepr> for Time {
    type Error = String;

    fn try_from(repr: TimeRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeRepr::Number(value) => Time::try_from(value),
            TimeRepr::Label(label) => match label.as_str() {
                "inf" | "+inf" => Ok(Time::INFINITY),
                "-inf" => Ok(Time::NEG_INFINITY),
                other => Err(format!("invalid time value '{}'", other)),
            },
        }
    }
}

impl From<Time> for TimeRepr {
    fn from(time: Time) -> Self {
        if time.is_pos_infinity() {
            TimeRepr::Label("inf".to_string())
        } else if time.is_neg_infinity() {
            TimeRepr::Label("-inf".to_string())
        } else {
            TimeRepr::Number(time.0)
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order_with_infinities() {
        let a = Time::new(-3.0).unwrap();
        let b = Time::new(4.5).unwrap();
        assert!(Time::NEG_INFINITY < a);
        assert!(a < b);
        assert!(b < Time::INFINITY);
        assert_eq!(Time::new(-0.0).unwrap(), Time::ZERO);
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Time::new(f64::NAN).is_none());
        assert!(Time::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_serde_infinities() {
        let json = serde_json::to_string(&[Time::NEG_INFINITY, Time::ZERO, Time::INFINITY]).unwrap();
        assert_eq!(json, r#"["-inf",0.0,"inf"]"#);

        let back: Vec<Time> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Time::NEG_INFINITY, Time::ZERO, Time::INFINITY]);

        let whole: Time = serde_json::from_str("3").unwrap();
        assert_eq!(whole, Time::new(3.0).unwrap());
        assert!(serde_json::from_str::<Time>(r#""soon""#).is_err());
        assert!(serde_json::from_str::<Time>("null").is_err());
    }

    #[test]
    fn test_min_max() {
        let a = Time::new(1.0).unwrap();
        let b = Time::new(2.0).unwrap();
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }
}
