//! Scalar conversion utilities
//!
//! String-to-number conversion follows PHP 5: arithmetic and loose
//! comparison read the longest numeric prefix, while `(int)` casts read only
//! the integer prefix.

/// A PHP number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Long(i64),
    Double(f64),
}

impl Number {
    pub fn to_double(self) -> f64 {
        match self {
            Number::Long(v) => v as f64,
            Number::Double(v) => v,
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Parse the longest numeric prefix of `s`.
///
/// Returns the number and the byte length consumed (0 when `s` has no
/// numeric prefix, in which case the number is `Long(0)`).
pub fn parse_number_prefix(s: &str) -> (Number, usize) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut is_double = false;
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = j - i - 1;
        if int_digits > 0 || frac_digits > 0 {
            is_double = true;
            i = j;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return (Number::Long(0), 0);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            is_double = true;
            i = j;
        }
    }
    let text = &s[start..i];
    if !is_double {
        if let Ok(v) = text.parse::<i64>() {
            return (Number::Long(v), i);
        }
    }
    (Number::Double(text.parse::<f64>().unwrap_or(0.0)), i)
}

/// The number a string denotes when the whole string is numeric
/// (leading whitespace allowed).
pub fn numeric_string(s: &str) -> Option<Number> {
    let (number, used) = parse_number_prefix(s);
    if used > 0 && used == s.len() {
        Some(number)
    } else {
        None
    }
}

/// Numeric value of a string in arithmetic and comparison
pub fn string_to_number(s: &str) -> Number {
    parse_number_prefix(s).0
}

/// `(int)` conversion: the integer prefix, saturating like `strtol`
pub fn string_to_long(s: &str) -> i64 {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    let negative = i < bytes.len() && bytes[i] == b'-';
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut value: i64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        let digit = i64::from(bytes[i] - b'0');
        value = match value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(digit) } else { v.checked_add(digit) })
        {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
        i += 1;
    }
    value
}

/// `(float)` conversion: the longest numeric prefix
pub fn string_to_double(s: &str) -> f64 {
    string_to_number(s).to_double()
}

/// `(int)` conversion of a float. Non-finite and out-of-range values
/// convert to 0.
pub fn double_to_long(d: f64) -> i64 {
    if d.is_finite() && d >= -9.223_372_036_854_775_808e18 && d < 9.223_372_036_854_775_808e18 {
        d as i64
    } else {
        0
    }
}

/// Format a float the way `echo` does (`precision = 14`).
pub fn double_to_string(d: f64) -> String {
    if d.is_nan() {
        return "NAN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if d == 0.0 {
        return if d.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let sci = format!("{:.13e}", d);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..14).contains(&exp) {
        let mut m = trim_fraction(mantissa).to_string();
        if !m.contains('.') {
            m.push_str(".0");
        }
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}E{}{}", m, sign, exp.abs())
    } else {
        let decimals = (13 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, d)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Canonical integer form of an array-key string (`"12"` but not `"012"`)
pub fn canonical_int_key(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_prefix() {
        assert_eq!(parse_number_prefix("42"), (Number::Long(42), 2));
        assert_eq!(parse_number_prefix("  -7abc"), (Number::Long(-7), 4));
        assert_eq!(parse_number_prefix("1.5e3x"), (Number::Double(1500.0), 5));
        assert_eq!(parse_number_prefix(".5"), (Number::Double(0.5), 2));
        assert_eq!(parse_number_prefix("abc"), (Number::Long(0), 0));
        assert_eq!(parse_number_prefix("1e"), (Number::Long(1), 1));
    }

    #[test]
    fn test_integer_overflow_becomes_double() {
        assert_eq!(
            parse_number_prefix("9223372036854775808").0,
            Number::Double(9.223_372_036_854_775_808e18)
        );
    }

    #[test]
    fn test_numeric_string() {
        assert_eq!(numeric_string(" 10"), Some(Number::Long(10)));
        assert_eq!(numeric_string("10 "), None);
        assert_eq!(numeric_string("1e3"), Some(Number::Double(1000.0)));
        assert_eq!(numeric_string(""), None);
    }

    #[test]
    fn test_string_to_long_uses_integer_prefix() {
        assert_eq!(string_to_long("1e3"), 1);
        assert_eq!(string_to_long("  -12.9"), -12);
        assert_eq!(string_to_long("99999999999999999999"), i64::MAX);
        assert_eq!(string_to_long("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_double_to_string() {
        assert_eq!(double_to_string(1.5), "1.5");
        assert_eq!(double_to_string(3.0), "3");
        assert_eq!(double_to_string(0.1 + 0.2), "0.3");
        assert_eq!(double_to_string(1e25), "1.0E+25");
        assert_eq!(double_to_string(0.00001), "1.0E-5");
        assert_eq!(double_to_string(-2.5e-7), "-2.5E-7");
        assert_eq!(double_to_string(f64::INFINITY), "INF");
    }

    #[test]
    fn test_canonical_int_key() {
        assert_eq!(canonical_int_key("12"), Some(12));
        assert_eq!(canonical_int_key("-3"), Some(-3));
        assert_eq!(canonical_int_key("012"), None);
        assert_eq!(canonical_int_key("1.0"), None);
        assert_eq!(canonical_int_key("-0"), None);
    }
}
