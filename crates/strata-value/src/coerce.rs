//! Scalar coercion of untyped text (XML text and attributes, INI values).

use crate::Value;

/// True when `s` is non-empty and made only of ASCII digits.
///
/// Signs, whitespace and decimal points are rejected.
pub fn looks_like_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// General numeric test.
///
/// Accepts optional surrounding whitespace, an optional sign, digits with an
/// optional decimal point (`5.`, `.5`, `5.5`) and an optional exponent.
pub fn is_numeric(s: &str) -> bool {
    let bytes = s.trim_matches(is_numeric_space).as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

fn is_numeric_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Coerce text to the most specific scalar it represents.
///
/// 1. digits only: [`Value::Int`] (a [`Value::Float`] when it overflows `i64`)
/// 2. any other numeric text: [`Value::Float`]
/// 3. `true` / `false` in any case: [`Value::Bool`]
/// 4. anything else: the original [`Value::String`]
///
/// ```rust
/// use strata_value::{coerce_scalar, Value};
///
/// assert_eq!(coerce_scalar("300"), Value::Int(300));
/// assert_eq!(coerce_scalar("32.5"), Value::Float(32.5));
/// assert_eq!(coerce_scalar("True"), Value::Bool(true));
/// assert_eq!(coerce_scalar("stream"), Value::from("stream"));
/// ```
pub fn coerce_scalar(s: &str) -> Value {
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
    }

    if is_numeric(s) {
        if let Ok(f) = s.trim_matches(is_numeric_space).parse::<f64>() {
            return Value::Float(f);
        }
    }

    if s.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::String(s.to_string())
    }
}

/// Format a float the way it reads in configuration text.
///
/// Integral values drop the fractional part (`3.0` becomes `"3"`).
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        format!("{}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_integer() {
        assert!(looks_like_integer("300"));
        assert!(looks_like_integer("007"));
        assert!(!looks_like_integer(""));
        assert!(!looks_like_integer("-3"));
        assert!(!looks_like_integer("3.0"));
        assert!(!looks_like_integer(" 3"));
    }

    #[test]
    fn test_is_numeric() {
        for ok in ["1", "-1", "+1.5", "1.", ".5", "1e3", "1E-3", " 12 ", "0.0"] {
            assert!(is_numeric(ok), "{ok:?} should be numeric");
        }
        for bad in ["", ".", "e3", "1e", "1.2.3", "0x1A", "abc", "1 2", "-", "+."] {
            assert!(!is_numeric(bad), "{bad:?} should not be numeric");
        }
    }

    #[test]
    fn test_coerce_scalar() {
        assert_eq!(coerce_scalar("0"), Value::Int(0));
        assert_eq!(coerce_scalar("007"), Value::Int(7));
        assert_eq!(coerce_scalar("-3"), Value::Float(-3.0));
        assert_eq!(coerce_scalar(" 12 "), Value::Float(12.0));
        assert_eq!(coerce_scalar("1e3"), Value::Float(1000.0));
        assert_eq!(coerce_scalar("FALSE"), Value::Bool(false));
        assert_eq!(coerce_scalar("yes"), Value::from("yes"));
        assert_eq!(coerce_scalar(""), Value::from(""));
    }

    #[test]
    fn test_coerce_integer_overflow_becomes_float() {
        assert_eq!(coerce_scalar("99999999999999999999"), Value::Float(1e20));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(32.5), "32.5");
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(-0.25), "-0.25");
        assert_eq!(format_float(f64::INFINITY), "INF");
    }
}
