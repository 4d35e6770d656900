//! Progress value object (0-100 scale, fractional).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A completion ratio expressed as a percentage.
///
/// Always finite. Construction from a ratio with a zero denominator
/// yields `None` instead of NaN.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(f64);

impl Progress {
    /// Zero percent.
    pub const ZERO: Self = Self(0.0);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(100.0);

    /// Computes `100 * part / whole`.
    ///
    /// Returns `None` when `whole` is zero.
    pub fn of(part: u64, whole: u64) -> Option<Self> {
        if whole == 0 {
            return None;
        }
        Some(Self(100.0 * part as f64 / whole as f64))
    }

    /// Returns the percentage value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Rendering fallback for an undefined progress.
    pub fn or_zero(progress: Option<Self>) -> Self {
        progress.unwrap_or(Self::ZERO)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_computes_percentage() {
        assert_eq!(Progress::of(1, 4), Some(Progress(25.0)));
        assert_eq!(Progress::of(3, 3), Some(Progress::HUNDRED));
    }

    #[test]
    fn of_zero_whole_is_none() {
        assert_eq!(Progress::of(0, 0), None);
        assert_eq!(Progress::of(5, 0), None);
    }

    #[test]
    fn or_zero_falls_back() {
        assert_eq!(Progress::or_zero(None), Progress::ZERO);
        assert_eq!(Progress::or_zero(Progress::of(1, 2)).value(), 50.0);
    }

    #[test]
    fn displays_one_decimal() {
        assert_eq!(format!("{}", Progress::of(1, 3).unwrap()), "33.3%");
        assert_eq!(format!("{}", Progress::ZERO), "0.0%");
    }
}
