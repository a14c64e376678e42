use std::error::Error;
use std::fmt;

/// InputValueError is used if some display option does not fulfill the posed requirements, e.g.,
/// a clock period outside of the supported range.
#[derive(Debug, Clone)]
pub struct InputValueError {
    pub name: &'static str,
    pub value: f64,
}

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value {} for {}", self.value, self.name)
    }
}

impl Error for InputValueError {}

/// round_half_away rounds x to the given number of decimals, with ties rounded away from zero.
pub fn round_half_away(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (x * scale).round() / scale
}

/// divmod returns the floored quotient and the remainder of x / d, like Python's divmod for
/// non-negative inputs.
pub fn divmod(x: f64, d: f64) -> (f64, f64) {
    let q = (x / d).floor();
    (q, x - q * d)
}

/// seconds_to_deciseconds converts a (possibly fractional) number of seconds into whole
/// deciseconds. Negative and non-finite inputs are clamped to zero.
pub fn seconds_to_deciseconds(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 10.0).round() as u64
}

/// number_text renders a number for display. Integral values are written without decimals, so
/// points sent as `4.0` show as `4`.
pub fn number_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rounds_ties_away_from_zero() {
        assert_relative_eq!(round_half_away(0.25, 1), 0.3);
        assert_relative_eq!(round_half_away(-0.25, 1), -0.3);
        assert_relative_eq!(round_half_away(9.96, 1), 10.0);
    }

    #[test]
    fn divmod_splits_minutes() {
        let (q, r) = divmod(65.0, 60.0);
        assert_relative_eq!(q, 1.0);
        assert_relative_eq!(r, 5.0);

        let (q, r) = divmod(42.3, 60.0);
        assert_relative_eq!(q, 0.0);
        assert_relative_eq!(r, 42.3);
    }

    #[test]
    fn converts_seconds_to_deciseconds() {
        assert_eq!(seconds_to_deciseconds(42.3), 423);
        assert_eq!(seconds_to_deciseconds(0.04), 0);
        assert_eq!(seconds_to_deciseconds(0.05), 1);
        assert_eq!(seconds_to_deciseconds(-3.0), 0);
        assert_eq!(seconds_to_deciseconds(f64::NAN), 0);
    }

    #[test]
    fn number_text_drops_integral_decimals() {
        assert_eq!(number_text(4.0), "4");
        assert_eq!(number_text(-2.0), "-2");
        assert_eq!(number_text(4.5), "4.5");
        assert_eq!(number_text(0.0), "0");
    }

    #[test]
    fn input_value_error_names_the_option() {
        let err = InputValueError {
            name: "tick_ms",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "Invalid input value 0 for tick_ms");
    }
}
