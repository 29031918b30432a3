//! Sampling rate resolution

use contracts::DEFAULT_RATE_HZ;

/// Where the effective rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Third positional argument
    Argument,
    /// `_rate:=` private parameter
    PrivateParam,
    /// `params.rate` in the node config
    Config,
    Default,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Argument => "argument",
            Self::PrivateParam => "private_param",
            Self::Config => "config",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Parse a rate the way C `atof` does
///
/// Leading whitespace is skipped and the longest numeric prefix is used,
/// decimal or `0x` hexadecimal (with an optional `p` binary exponent).
/// Text without a numeric prefix yields 0.0.
pub fn parse_rate_lenient(text: &str) -> f64 {
    let text = text.trim_start();
    if let Some(value) = parse_hex_prefix(text) {
        return value;
    }
    text.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// `[+-]0x<hex>[.<hex>][p[+-]<dec>]`, None unless at least one hex digit follows `0x`
fn parse_hex_prefix(text: &str) -> Option<f64> {
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1.0, &text[1..]),
        Some(b'+') => (1.0, &text[1..]),
        _ => (1.0, text),
    };
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))?;

    let mut mantissa = 0.0_f64;
    let mut scale = 0_i32;
    let mut digits = 0;
    let mut seen_point = false;
    let mut chars = rest.char_indices().peekable();
    while let Some(&(_, c)) = chars.peek() {
        if let Some(d) = c.to_digit(16) {
            mantissa = mantissa * 16.0 + f64::from(d);
            if seen_point {
                scale -= 4;
            }
            digits += 1;
        } else if c == '.' && !seen_point {
            seen_point = true;
        } else {
            break;
        }
        chars.next();
    }
    if digits == 0 {
        return None;
    }

    let tail = chars.next().map_or("", |(i, _)| &rest[i..]);
    if let Some(exp_text) = tail.strip_prefix(['p', 'P']) {
        let exp_len = exp_text
            .char_indices()
            .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-')))
            .count();
        if let Ok(exp) = exp_text[..exp_len].parse::<i32>() {
            scale = scale.saturating_add(exp);
        }
    }

    Some(sign * mantissa * 2f64.powi(scale))
}

/// Pick the effective rate
///
/// Precedence: positional argument, then `_rate:=`, then the config file,
/// then `DEFAULT_RATE_HZ`. A private parameter that is not a number is
/// ignored.
pub fn resolve_rate(
    argument: Option<&str>,
    private_param: Option<&str>,
    configured: Option<f64>,
) -> (f64, RateSource) {
    if let Some(text) = argument {
        return (parse_rate_lenient(text), RateSource::Argument);
    }
    if let Some(rate) = private_param.and_then(|v| v.trim().parse::<f64>().ok()) {
        return (rate, RateSource::PrivateParam);
    }
    match configured {
        Some(rate) => (rate, RateSource::Config),
        None => (DEFAULT_RATE_HZ, RateSource::Default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_lenient() {
        assert_eq!(parse_rate_lenient("10"), 10.0);
        assert_eq!(parse_rate_lenient("  2.5"), 2.5);
        assert_eq!(parse_rate_lenient("5hz"), 5.0);
        assert_eq!(parse_rate_lenient("1e2"), 100.0);
        assert_eq!(parse_rate_lenient("3e"), 3.0);
        assert_eq!(parse_rate_lenient(".5"), 0.5);
        assert_eq!(parse_rate_lenient("-4"), -4.0);
        assert_eq!(parse_rate_lenient("fast"), 0.0);
        assert_eq!(parse_rate_lenient("0x"), 0.0);
        assert_eq!(parse_rate_lenient("0xzz"), 0.0);
        assert_eq!(parse_rate_lenient(""), 0.0);
    }

    #[test]
    fn test_parse_rate_lenient_hex() {
        assert_eq!(parse_rate_lenient("0x10"), 16.0);
        assert_eq!(parse_rate_lenient(" 0XA"), 10.0);
        assert_eq!(parse_rate_lenient("-0x2"), -2.0);
        assert_eq!(parse_rate_lenient("0x1.8"), 1.5);
        assert_eq!(parse_rate_lenient("0x1p4"), 16.0);
        assert_eq!(parse_rate_lenient("0x10p-1hz"), 8.0);
        assert_eq!(parse_rate_lenient("0x4p"), 4.0);
    }

    #[test]
    fn test_resolve_rate_precedence() {
        assert_eq!(
            resolve_rate(Some("20"), Some("5"), Some(2.0)),
            (20.0, RateSource::Argument)
        );
        assert_eq!(
            resolve_rate(None, Some("5"), Some(2.0)),
            (5.0, RateSource::PrivateParam)
        );
        assert_eq!(resolve_rate(None, None, Some(2.0)), (2.0, RateSource::Config));
        assert_eq!(
            resolve_rate(None, None, None),
            (DEFAULT_RATE_HZ, RateSource::Default)
        );
    }

    #[test]
    fn test_non_numeric_private_param_falls_through() {
        assert_eq!(
            resolve_rate(None, Some("quick"), Some(2.0)),
            (2.0, RateSource::Config)
        );
    }

    #[test]
    fn test_unparseable_argument_is_zero() {
        assert_eq!(resolve_rate(Some("abc"), None, None), (0.0, RateSource::Argument));
    }
}
