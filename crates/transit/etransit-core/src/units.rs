//! Unit suffixing, number formatting and property-name case helpers.

/// Format a number the way style strings expect it (`50`, `0.5`, `-12.25`).
#[inline]
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{n}")
}

/// True when `s` is a bare numeric literal (`12`, `-3.5`, `.25`) with no unit.
fn is_bare_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.')
}

/// Append `unit` to a bare numeric string; anything else (`"30deg"`, `"auto"`) is
/// returned untouched.
pub fn unit(value: &str, unit: &str) -> String {
    let trimmed = value.trim();
    if is_bare_number(trimmed) {
        format!("{trimmed}{unit}")
    } else {
        trimmed.to_string()
    }
}

#[inline]
pub fn unit_number(value: f64, unit: &str) -> String {
    format!("{}{unit}", format_number(value))
}

/// `250` -> `"250ms"`.
#[inline]
pub fn to_ms(value: f64) -> String {
    unit_number(value, "ms")
}

/// Parse the leading numeric prefix of `s`, like a lenient float reader:
/// `"50px"` -> 50, `" -2.5deg"` -> -2.5, `"1e3"` -> 1000. Returns `NaN` when no
/// number is present.
pub fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let mantissa = &s[digits_start..end];
    if mantissa.is_empty() || mantissa == "." {
        return f64::NAN;
    }
    // Optional exponent, only consumed when well formed.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// `"text-align"` -> `"textAlign"`, `"-ms-transform"` -> `"msTransform"`.
pub fn camel_case(name: &str) -> String {
    let name = name.strip_prefix("-ms-").map_or_else(
        || name.to_string(),
        |rest| format!("ms-{rest}"),
    );
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
            continue;
        }
        if upper_next && c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
        } else {
            if upper_next {
                out.push('-');
            }
            out.push(c);
        }
        upper_next = false;
    }
    if upper_next {
        out.push('-');
    }
    out
}

/// `"marginLeft"` -> `"margin-left"`, `"WebkitTransform"` -> `"-webkit-transform"`.
pub fn uncamel(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Uppercase the first character (`"transition"` -> `"Transition"`).
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Round to three decimals.
#[inline]
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_only_suffixes_bare_numbers() {
        assert_eq!(unit("30", "deg"), "30deg");
        assert_eq!(unit("-1.5", "px"), "-1.5px");
        assert_eq!(unit("30deg", "deg"), "30deg");
        assert_eq!(unit(" 5", "px"), "5px");
        assert_eq!(unit("auto", "px"), "auto");
    }

    #[test]
    fn parse_float_reads_prefix() {
        assert_eq!(parse_float("50px"), 50.0);
        assert_eq!(parse_float("  -2.5deg"), -2.5);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("1e3ms"), 1000.0);
        assert_eq!(parse_float("2em"), 2.0);
        assert!(parse_float("none").is_nan());
        assert!(parse_float("").is_nan());
    }

    #[test]
    fn case_conversions() {
        assert_eq!(camel_case("text-align"), "textAlign");
        assert_eq!(camel_case("-ms-transform"), "msTransform");
        assert_eq!(camel_case("opacity"), "opacity");
        assert_eq!(uncamel("marginLeft"), "margin-left");
        assert_eq!(uncamel("WebkitTransform"), "-webkit-transform");
        assert_eq!(capitalize("transition"), "Transition");
    }

    #[test]
    fn numbers_format_without_trailing_zero() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(to_ms(250.0), "250ms");
        assert_eq!(round3(0.12345), 0.123);
    }
}
