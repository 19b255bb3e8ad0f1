// src/core/modifiers.rs

//! # Modifier Pipeline
//!
//! Runs a specifier's modifier chain over its list. Every modifier consumes the
//! list produced by the previous one and returns a fresh list; `transpose` and
//! `insert-at-index` leave the contents alone because they only affect how the
//! list is consumed later.

use crate::core::commons::escape_for_shell;
use crate::core::error::ModifierError;
use crate::core::printf::{FormatArg, format_value};
use crate::core::slices::{apply_slices, slice_chars};
use crate::core::sources::{ListSources, ScriptFunction};
use crate::models::{FormatConversion, ListSourceSpecifier, ModifierSpec, RegexPattern, StripSide};
use globset::GlobBuilder;
use log::{trace, warn};

/// Applies `modifiers`, in order, to `values`.
///
/// `context` is the specifier the chain belongs to; it is handed to script hooks.
pub fn apply_modifiers(
    values: Vec<String>,
    modifiers: &[ModifierSpec],
    context: &ListSourceSpecifier,
    sources: &mut dyn ListSources,
) -> Result<Vec<String>, ModifierError> {
    let mut current = values;
    for modifier in modifiers.iter().filter(|m| m.transforms_list()) {
        current = apply_modifier(current, modifier, context, sources)?;
        trace!("After {:?}: {} element(s).", modifier, current.len());
    }
    Ok(current)
}

fn apply_modifier(
    values: Vec<String>,
    modifier: &ModifierSpec,
    context: &ListSourceSpecifier,
    sources: &mut dyn ListSources,
) -> Result<Vec<String>, ModifierError> {
    let result = match modifier {
        ModifierSpec::Escape => values
            .into_iter()
            .map(|v| escape_for_shell(&v).ok_or(ModifierError::Escape(v)))
            .collect::<Result<Vec<_>, _>>()?,
        ModifierSpec::Format { conversion, format } => values
            .iter()
            .map(|v| format_element(v, *conversion, format))
            .collect::<Result<Vec<_>, _>>()?,
        ModifierSpec::Flatten { separator } => vec![values.join(separator)],
        ModifierSpec::FilterRegex(pattern) => values
            .into_iter()
            .filter(|v| pattern.regex().is_match(v))
            .collect(),
        ModifierSpec::ExtractRegex { group, pattern } => values
            .iter()
            .map(|v| extract_group(v, *group, pattern))
            .collect(),
        ModifierSpec::Replace { from, to } => values.iter().map(|v| v.replace(from, to)).collect(),
        ModifierSpec::Slice { exclude, slices } => apply_slices(&values, slices, *exclude),
        ModifierSpec::Split(pattern) => values
            .iter()
            .flat_map(|v| {
                pattern
                    .regex()
                    .split(v)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect(),
        ModifierSpec::Substring(slice) => values.iter().map(|v| slice_chars(v, slice)).collect(),
        ModifierSpec::Strip { side, chars } => values
            .iter()
            .map(|v| strip(v, *side, chars.as_deref()))
            .collect(),
        ModifierSpec::Wildcard { inverted, pattern } => {
            let matcher = GlobBuilder::new(pattern)
                .case_insensitive(cfg!(windows))
                .build()
                .map_err(|source| ModifierError::Wildcard {
                    pattern: pattern.clone(),
                    source,
                })?
                .compile_matcher();
            values
                .into_iter()
                .filter(|v| matcher.is_match(v.as_str()) != *inverted)
                .collect()
        }
        ModifierSpec::ExtractAll { group, pattern } => values
            .iter()
            .flat_map(|v| extract_all(v, *group, pattern))
            .collect(),
        ModifierSpec::Subprocess(command) => {
            let input = (!values.is_empty()).then_some(values.as_slice());
            match sources.subprocess_lines(command, input) {
                Ok(lines) => lines,
                Err(err) if err.degrades_to_empty() => {
                    warn!("{}; continuing with an empty list.", err);
                    Vec::new()
                }
                Err(err) => return Err(err.into()),
            }
        }
        ModifierSpec::ScriptHook { path, argument } => sources.script_lines(
            path,
            ScriptFunction::Modify,
            context,
            argument.as_deref(),
            Some(&values),
        )?,
        ModifierSpec::Transpose | ModifierSpec::InsertAt(_) => values,
    };
    Ok(result)
}

fn format_element(
    value: &str,
    conversion: FormatConversion,
    format: &str,
) -> Result<String, ModifierError> {
    let arg = match conversion {
        FormatConversion::None => FormatArg::Str(value),
        FormatConversion::Int => {
            FormatArg::Int(value.trim().parse::<i64>().map_err(|_| ModifierError::Conversion {
                value: value.to_string(),
                target: "an integer",
            })?)
        }
        FormatConversion::Float => {
            FormatArg::Float(value.trim().parse::<f64>().map_err(|_| ModifierError::Conversion {
                value: value.to_string(),
                target: "a float",
            })?)
        }
    };
    format_value(format, arg).map_err(|source| ModifierError::Format {
        format: format.to_string(),
        source,
    })
}

/// The requested capture group of the first match, the whole match when the
/// pattern has fewer groups, or an empty string when nothing matches.
fn extract_group(value: &str, group: usize, pattern: &RegexPattern) -> String {
    let regex = pattern.regex();
    let Some(captures) = regex.captures(value) else {
        return String::new();
    };
    let index = if group >= 1 && group < regex.captures_len() {
        group
    } else {
        0
    };
    captures
        .get(index)
        .map_or_else(String::new, |m| m.as_str().to_string())
}

fn extract_all(value: &str, group: usize, pattern: &RegexPattern) -> Vec<String> {
    let regex = pattern.regex();
    let index = if group >= 1 && group < regex.captures_len() {
        group
    } else {
        0
    };
    regex
        .captures_iter(value)
        .map(|captures| {
            captures
                .get(index)
                .map_or_else(String::new, |m| m.as_str().to_string())
        })
        .collect()
}

fn strip(value: &str, side: StripSide, chars: Option<&str>) -> String {
    let stripped = match chars {
        None => match side {
            StripSide::Both => value.trim(),
            StripSide::Left => value.trim_start(),
            StripSide::Right => value.trim_end(),
        },
        Some(set) => {
            let in_set = |c: char| set.contains(c);
            match side {
                StripSide::Both => value.trim_matches(in_set),
                StripSide::Left => value.trim_start_matches(in_set),
                StripSide::Right => value.trim_end_matches(in_set),
            }
        }
    };
    stripped.to_string()
}
