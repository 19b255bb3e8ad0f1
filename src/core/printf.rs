//! # printf
//!
//! Formats a single value with a printf-style format string, following the rules of
//! the classic `%` operator: exactly one conversion must consume the value, `%%` is a
//! literal percent sign, and numeric conversions reject text.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("not enough arguments for format string")]
    NotEnoughArguments,
    #[error("not all arguments converted during string formatting")]
    UnusedArgument,
    #[error("incomplete format")]
    Incomplete,
    #[error("unsupported format character '{0}'")]
    UnsupportedConversion(char),
    #[error("%{conversion} format: a number is required, not {found}")]
    TypeMismatch { conversion: char, found: &'static str },
    #[error("%c requires an integer or a single character")]
    InvalidChar,
}

/// The value handed to a format string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
}

impl FormatArg<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            FormatArg::Str(_) => "str",
            FormatArg::Int(_) => "int",
            FormatArg::Float(_) => "float",
        }
    }
}

#[derive(Debug, Default)]
struct ConversionSpec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Formats `arg` with `format`.
pub fn format_value(format: &str, arg: FormatArg<'_>) -> Result<String, FormatError> {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars().peekable();
    let mut consumed = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = ConversionSpec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '#' => spec.alternate = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = read_number(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(read_number(&mut chars).unwrap_or(0));
        }
        // Length modifiers are accepted and ignored.
        while matches!(chars.peek(), Some('h' | 'l' | 'L')) {
            chars.next();
        }

        let conversion = chars.next().ok_or(FormatError::Incomplete)?;
        if conversion == '%' {
            out.push('%');
            continue;
        }
        if consumed {
            return Err(FormatError::NotEnoughArguments);
        }
        consumed = true;
        out.push_str(&render(conversion, &spec, arg)?);
    }

    if !consumed {
        return Err(FormatError::UnusedArgument);
    }
    Ok(out)
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        let current = value.unwrap_or(0);
        value = Some(
            current
                .saturating_mul(10)
                .saturating_add(usize::try_from(digit).unwrap_or(0)),
        );
    }
    value
}

fn render(conversion: char, spec: &ConversionSpec, arg: FormatArg<'_>) -> Result<String, FormatError> {
    match conversion {
        's' | 'r' | 'a' => {
            let mut text = match arg {
                FormatArg::Str(s) if conversion == 's' => s.to_string(),
                FormatArg::Str(s) => format!("'{}'", s.replace('\'', "\\'")),
                FormatArg::Int(i) => i.to_string(),
                FormatArg::Float(f) => float_repr(f),
            };
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            Ok(pad(String::new(), "", &text, spec, false))
        }
        'd' | 'i' | 'u' => {
            let value = integer_of(arg, conversion)?;
            let digits = with_min_digits(value.unsigned_abs().to_string(), spec.precision);
            Ok(pad(sign_of(value < 0, spec), "", &digits, spec, true))
        }
        'x' | 'X' | 'o' => {
            let value = match arg {
                FormatArg::Int(i) => i,
                other => {
                    return Err(FormatError::TypeMismatch {
                        conversion,
                        found: other.type_name(),
                    });
                }
            };
            let (digits, prefix) = match conversion {
                'x' => (format!("{:x}", value.unsigned_abs()), "0x"),
                'X' => (format!("{:X}", value.unsigned_abs()), "0X"),
                _ => (format!("{:o}", value.unsigned_abs()), "0o"),
            };
            let digits = with_min_digits(digits, spec.precision);
            let prefix = if spec.alternate { prefix } else { "" };
            Ok(pad(sign_of(value < 0, spec), prefix, &digits, spec, true))
        }
        'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
            let value = match arg {
                FormatArg::Int(i) => i as f64,
                FormatArg::Float(f) => f,
                FormatArg::Str(_) => {
                    return Err(FormatError::TypeMismatch {
                        conversion,
                        found: "str",
                    });
                }
            };
            Ok(render_float(conversion, spec, value))
        }
        'c' => {
            let text = match arg {
                FormatArg::Int(i) => u32::try_from(i)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(FormatError::InvalidChar)?
                    .to_string(),
                FormatArg::Str(s) if s.chars().count() == 1 => s.to_string(),
                _ => return Err(FormatError::InvalidChar),
            };
            Ok(pad(String::new(), "", &text, spec, false))
        }
        other => Err(FormatError::UnsupportedConversion(other)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_of(arg: FormatArg<'_>, conversion: char) -> Result<i64, FormatError> {
    match arg {
        FormatArg::Int(i) => Ok(i),
        // Saturating float-to-int cast, matching truncation towards zero.
        FormatArg::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
        other => Err(FormatError::TypeMismatch {
            conversion,
            found: other.type_name(),
        }),
    }
}

fn float_repr(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value < 0.0 { "-inf" } else { "inf" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn sign_of(negative: bool, spec: &ConversionSpec) -> String {
    if negative {
        "-".to_string()
    } else if spec.plus {
        "+".to_string()
    } else if spec.space {
        " ".to_string()
    } else {
        String::new()
    }
}

fn with_min_digits(digits: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) if digits.len() < p => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    }
}

/// Applies width and alignment. Zero padding goes between the sign/prefix and the digits.
fn pad(sign: String, prefix: &str, body: &str, spec: &ConversionSpec, numeric: bool) -> String {
    let len = sign.len() + prefix.len() + body.chars().count();
    if len >= spec.width {
        return format!("{}{}{}", sign, prefix, body);
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{}{}{}{}", sign, prefix, body, " ".repeat(fill))
    } else if spec.zero && numeric {
        format!("{}{}{}{}", sign, prefix, "0".repeat(fill), body)
    } else {
        format!("{}{}{}{}", " ".repeat(fill), sign, prefix, body)
    }
}

fn render_float(conversion: char, spec: &ConversionSpec, value: f64) -> String {
    let upper = conversion.is_ascii_uppercase();
    let magnitude = value.abs();
    let sign = sign_of(value.is_sign_negative() && !value.is_nan(), spec);

    if !magnitude.is_finite() {
        let word = if magnitude.is_nan() { "nan" } else { "inf" };
        let word = if upper { word.to_uppercase() } else { word.to_string() };
        return pad(sign, "", &word, spec, false);
    }

    let precision = spec.precision.unwrap_or(6);
    let mut body = match conversion.to_ascii_lowercase() {
        'f' => format!("{:.*}", precision, magnitude),
        'e' => exponent_notation(magnitude, precision, upper),
        _ => general_notation(magnitude, spec.precision, spec.alternate, upper),
    };
    if spec.alternate && !body.contains('.') && conversion.to_ascii_lowercase() == 'f' {
        body.push('.');
    }
    pad(sign, "", &body, spec, true)
}

fn split_exponent(rendered: &str) -> (&str, i32) {
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (rendered, 0),
    }
}

fn exponent_notation(magnitude: f64, precision: usize, upper: bool) -> String {
    let rendered = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = split_exponent(&rendered);
    format!(
        "{}{}{}{:02}",
        mantissa,
        if upper { 'E' } else { 'e' },
        if exponent < 0 { '-' } else { '+' },
        exponent.unsigned_abs()
    )
}

fn general_notation(magnitude: f64, precision: Option<usize>, alternate: bool, upper: bool) -> String {
    let significant = match precision {
        Some(0) => 1,
        Some(p) => p,
        None => 6,
    };
    let rendered = format!("{:.*e}", significant - 1, magnitude);
    let (_, exponent) = split_exponent(&rendered);
    let significant_i32 = i32::try_from(significant).unwrap_or(i32::MAX);

    let body = if (-4..significant_i32).contains(&exponent) {
        let decimals = usize::try_from(significant_i32 - 1 - exponent).unwrap_or(0);
        format!("{:.*}", decimals, magnitude)
    } else {
        exponent_notation(magnitude, significant - 1, upper)
    };

    if alternate {
        return body;
    }
    let (mantissa, tail) = match body.find(['e', 'E']) {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, tail)
}
