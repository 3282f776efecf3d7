use std::sync::LazyLock;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use regex::Regex;
use serde_json::Value;

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])?(\d+)(?:\.(\d+))?$").unwrap());
static NUMERIC_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?").unwrap());

const ZERO: &str = "0";

/// Canonical decimal string for a raw area value. Never fails: junk becomes "0".
pub fn normalize(raw: &str) -> String {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return ZERO.to_string();
    }

    if let Some((unscaled, scale)) = parse_exact(&cleaned) {
        return render(&unscaled, scale);
    }

    best_effort(&cleaned).unwrap_or_else(|| ZERO.to_string())
}

/// Same as [`normalize`] for a JSON value straight out of a registry row.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => normalize(s),
        Value::Number(n) => normalize(&n.to_string()),
        _ => ZERO.to_string(),
    }
}

/// Exact sum of two decimal strings.
pub fn add(a: &str, b: &str) -> String {
    let (ua, sa) = operand(a);
    let (ub, sb) = operand(b);
    let scale = sa.max(sb);

    let total = rescale(ua, scale - sa) + rescale(ub, scale - sb);
    render(&total, scale)
}

pub fn is_zero(value: &str) -> bool {
    operand(value).0.is_zero()
}

pub fn is_negative(value: &str) -> bool {
    operand(value).0.sign() == Sign::Minus
}

/// Splits `[+-]digits[.digits]` into an unscaled integer and its fractional scale.
fn parse_exact(s: &str) -> Option<(BigInt, usize)> {
    let caps = DECIMAL_RE.captures(s)?;
    let int_part = &caps[2];
    let frac_part = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let digits = format!("{}{}", int_part, frac_part);
    let mut unscaled: BigInt = digits.parse().ok()?;
    if caps.get(1).map(|m| m.as_str()) == Some("-") {
        unscaled = -unscaled;
    }
    Some((unscaled, frac_part.len()))
}

fn best_effort(s: &str) -> Option<String> {
    if let Ok(f) = s.parse::<f64>() {
        if !f.is_finite() {
            return None;
        }
        // f64 Display never uses exponent notation, so this always re-parses.
        let (unscaled, scale) = parse_exact(&f.to_string())?;
        return Some(render(&unscaled, scale));
    }

    let prefix = NUMERIC_PREFIX_RE.find(s)?;
    let (unscaled, scale) = parse_exact(prefix.as_str())?;
    Some(render(&unscaled, scale))
}

fn operand(s: &str) -> (BigInt, usize) {
    parse_exact(s)
        .or_else(|| parse_exact(&normalize(s)))
        .unwrap_or_else(|| (BigInt::zero(), 0))
}

fn rescale(unscaled: BigInt, extra_digits: usize) -> BigInt {
    if extra_digits == 0 {
        return unscaled;
    }
    unscaled * BigInt::from(10u32).pow(extra_digits as u32)
}

fn render(unscaled: &BigInt, scale: usize) -> String {
    let factor = BigUint::from(10u32).pow(scale as u32);
    let magnitude = unscaled.magnitude();
    let int_part = magnitude / &factor;
    let frac_part = magnitude % &factor;

    let mut frac = if scale == 0 {
        String::new()
    } else {
        format!("{:0>width$}", frac_part.to_string(), width = scale)
    };
    while frac.ends_with('0') {
        frac.pop();
    }

    let mut out = String::new();
    if unscaled.sign() == Sign::Minus {
        out.push('-');
    }
    out.push_str(&int_part.to_string());
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_mixed_scales() {
        assert_eq!(add("10.5", "0.25"), "10.75");
        assert_eq!(add("0.1", "0.1"), "0.2");
        assert_eq!(add("1", "2"), "3");
        assert_eq!(add("0.75", "0.25"), "1");
    }

    #[test]
    fn add_has_no_drift() {
        let mut total = "0".to_string();
        for _ in 0..1000 {
            total = add(&total, "0.1");
        }
        assert_eq!(total, "100");
    }

    #[test]
    fn add_handles_signs_and_magnitude() {
        assert_eq!(add("-5.5", "2.25"), "-3.25");
        assert_eq!(add("-0.5", "0.5"), "0");
        assert_eq!(
            add("99999999999999999999.99", "0.01"),
            "100000000000000000000"
        );
    }

    #[test]
    fn add_degrades_junk_operands() {
        assert_eq!(add("abc", "3.5"), "3.5");
        assert_eq!(add("1,000", "0.5"), "1000.5");
    }

    #[test]
    fn normalize_strips_separators_and_zeros() {
        assert_eq!(normalize("1,234.50"), "1234.5");
        assert_eq!(normalize("  42 "), "42");
        assert_eq!(normalize("+007.000"), "7");
        assert_eq!(normalize("-0.0"), "0");
    }

    #[test]
    fn normalize_keeps_interior_spaces() {
        // Only the ends are trimmed; "12 34" is not one number.
        assert_eq!(normalize("12 34"), "12");
        assert_eq!(normalize("\t1,024.0\n"), "1024");
    }

    #[test]
    fn normalize_unparseable_is_zero() {
        assert_eq!(normalize(""), "0");
        assert_eq!(normalize("abc"), "0");
        assert_eq!(normalize("NaN"), "0");
        assert_eq!(normalize("inf"), "0");
    }

    #[test]
    fn normalize_best_effort() {
        assert_eq!(normalize("1e3"), "1000");
        assert_eq!(normalize(".5"), "0.5");
        assert_eq!(normalize("12.5㎡"), "12.5");
    }

    #[test]
    fn normalize_json_values() {
        assert_eq!(normalize_value(&serde_json::json!(12.5)), "12.5");
        assert_eq!(normalize_value(&serde_json::json!(300)), "300");
        assert_eq!(normalize_value(&serde_json::json!("88.10")), "88.1");
        assert_eq!(normalize_value(&Value::Null), "0");
    }

    #[test]
    fn predicates() {
        assert!(is_zero("0.000"));
        assert!(!is_zero("0.001"));
        assert!(is_negative("-1"));
        assert!(!is_negative("0"));
    }
}
