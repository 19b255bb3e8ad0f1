// src/core/specifier_parser.rs

//! # Specifier Parser
//!
//! Turns a single token such as `fapply+[rm:\.rs$]+[e]-files.txt` into a
//! [`ListSourceSpecifier`]. A token that does not look like a specifier yields
//! `Ok(None)` so the caller can treat it as a literal argument; a token that does
//! look like one but carries malformed modifier syntax is a hard error.

use crate::core::error::SpecifierError;
use crate::core::slices;
use crate::models::{
    FormatConversion, ListSourceSpecifier, ModifierSpec, RegexPattern, SourceKind, StripSide,
};
use globset::GlobBuilder;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref SPECIFIER_RE: Regex = Regex::new(r"(?i)^(dm|py|[cdfghipr])apply(.*)$").unwrap();
    static ref BARE_INDEX_RE: Regex = Regex::new(r"^-?\d+$").unwrap();
}

lazy_static! {
    // One pattern per modifier keyword, tried in this order.
    static ref FORMAT_RE: Regex = Regex::new(r"(?is)^(f[if]?):(.+)$").unwrap();
    static ref FLATTEN_RE: Regex = Regex::new(r"(?is)^fl(:(.*))?$").unwrap();
    static ref SUBPROCESS_RE: Regex = Regex::new(r"(?is)^g:(.+)$").unwrap();
    static ref INSERT_RE: Regex = Regex::new(r"(?i)^i:(\d+)$").unwrap();
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)^py:([^,]+)(?:,(.+))?$").unwrap();
    static ref REPLACE_RE: Regex = Regex::new(r"(?is)^rep:([^:]+)(?::(.*))?$").unwrap();
    static ref REGEX_RE: Regex = Regex::new(r"(?is)^(rms|rm|rs)(\d+)?:(.+)$").unwrap();
    static ref SLICE_RE: Regex = Regex::new(r"(?i)^s(-?):([\d:,\-]+)$").unwrap();
    static ref SPLIT_RE: Regex = Regex::new(r"(?is)^sp:(.+)$").unwrap();
    static ref SUBSTRING_RE: Regex = Regex::new(r"(?i)^ss:([\d:\-]+)$").unwrap();
    static ref STRIP_RE: Regex = Regex::new(r"(?is)^st([lr]?)(?::(.+))?$").unwrap();
    static ref WILDCARD_RE: Regex = Regex::new(r"(?is)^w(-)?:(.+)$").unwrap();
    static ref EXTRACT_ALL_RE: Regex = Regex::new(r"(?is)^xtr(\d+)?:(.+)$").unwrap();
}

// --- PUBLIC API ---

/// Parses `text` as a list-source specifier.
///
/// Returns `Ok(None)` when the token is not a specifier at all.
pub fn parse_specifier(text: &str) -> Result<Option<ListSourceSpecifier>, SpecifierError> {
    if BARE_INDEX_RE.is_match(text) {
        let index = parse_index(text)?;
        return Ok(Some(ListSourceSpecifier {
            kind: SourceKind::DuplicateOf(index),
            source_argument: Some(text.to_string()),
            modifiers: Vec::new(),
            original_token: text.to_string(),
        }));
    }

    let Some(captures) = SPECIFIER_RE.captures(text) else {
        return Ok(None);
    };
    let letters = group(&captures, 1).to_ascii_lowercase();
    let rest = group(&captures, 2);

    let (modifiers, source_argument) = scan_arguments(text, rest)?;
    let kind = source_kind(text, &letters, source_argument.as_deref())?;

    if let Some(position) = modifiers
        .iter()
        .position(|m| matches!(m, ModifierSpec::Transpose))
    {
        if position + 1 != modifiers.len() {
            return Err(SpecifierError::TransposeNotLast(text.to_string()));
        }
    }

    log::trace!(
        "Parsed specifier '{}' as {:?} with {} modifier(s).",
        text,
        kind,
        modifiers.len()
    );

    Ok(Some(ListSourceSpecifier {
        kind,
        source_argument,
        modifiers,
        original_token: text.to_string(),
    }))
}

/// Parses a range expression: `stop`, `start,stop` or `start,stop,step`, end exclusive.
pub fn parse_range(text: &str) -> Result<(i64, i64, i64), SpecifierError> {
    let invalid = || SpecifierError::InvalidRange(text.to_string());
    let numbers = text
        .split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let bounds = match numbers.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(invalid()),
    };
    if bounds.2 == 0 {
        return Err(invalid());
    }
    Ok(bounds)
}

// --- SCANNING ---

fn group<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures.get(index).map_or("", |m| m.as_str())
}

fn parse_index(text: &str) -> Result<isize, SpecifierError> {
    text.trim()
        .parse::<isize>()
        .map_err(|_| SpecifierError::InvalidDuplicateIndex(text.to_string()))
}

/// Splits the text after `apply` into modifier texts and the source argument.
///
/// `+[...]` closes at the first `]` followed by the end of text, `+` or `-`.
/// `-` starts the source argument, which runs to the end of the token.
fn scan_arguments(
    token: &str,
    rest: &str,
) -> Result<(Vec<ModifierSpec>, Option<String>), SpecifierError> {
    let mut modifiers = Vec::new();
    let mut argument = None;
    let mut remaining = rest;

    while !remaining.is_empty() {
        if let Some(inner) = remaining.strip_prefix("+[") {
            let (text, after) = split_modifier(inner)
                .ok_or_else(|| SpecifierError::UnclosedModifier(token.to_string()))?;
            parse_modifier(text, &mut modifiers)?;
            remaining = after;
        } else if let Some(value) = remaining.strip_prefix('-') {
            if !value.is_empty() {
                argument = Some(value.to_string());
            }
            break;
        } else {
            return Err(SpecifierError::Malformed {
                token: token.to_string(),
                position: token.len() - remaining.len(),
            });
        }
    }

    Ok((modifiers, argument))
}

fn split_modifier(inner: &str) -> Option<(&str, &str)> {
    for (index, c) in inner.char_indices() {
        if c != ']' || index == 0 {
            continue;
        }
        let (text, closing) = inner.split_at(index);
        let after = closing.strip_prefix(']')?;
        if after.is_empty() || after.starts_with(['+', '-']) {
            return Some((text, after));
        }
    }
    None
}

fn source_kind(
    token: &str,
    letters: &str,
    argument: Option<&str>,
) -> Result<SourceKind, SpecifierError> {
    let required = || argument.ok_or_else(|| SpecifierError::MissingArgument(token.to_string()));

    let kind = match letters {
        "c" => SourceKind::Clipboard,
        "p" => SourceKind::Stdin,
        "d" => SourceKind::DuplicateOf(parse_index(required()?)?),
        "dm" => SourceKind::DuplicateWithModifiersOf(parse_index(required()?)?),
        "f" => {
            required()?;
            SourceKind::File
        }
        "g" => {
            required()?;
            SourceKind::ProcessOutput
        }
        "h" => {
            required()?;
            SourceKind::Url
        }
        "i" => {
            required()?;
            SourceKind::InlineCsv
        }
        "py" => {
            required()?;
            SourceKind::ExternalScript
        }
        "r" => {
            parse_range(required()?)?;
            SourceKind::Range
        }
        // SPECIFIER_RE only admits the letters above.
        other => {
            return Err(SpecifierError::Malformed {
                token: other.to_string(),
                position: 0,
            });
        }
    };
    Ok(kind)
}

// --- MODIFIERS ---

fn compile(pattern: &str, case_insensitive: bool) -> Result<RegexPattern, SpecifierError> {
    RegexPattern::new(pattern, case_insensitive).map_err(|source| SpecifierError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn parse_group_number(text: &str) -> Result<usize, SpecifierError> {
    if text.is_empty() {
        return Ok(1);
    }
    text.parse::<usize>()
        .map_err(|_| SpecifierError::InvalidNumber(text.to_string()))
}

/// Parses the text between `+[` and `]`, appending one or more modifiers.
fn parse_modifier(text: &str, out: &mut Vec<ModifierSpec>) -> Result<(), SpecifierError> {
    let keyword = text.to_ascii_lowercase();

    if keyword == "e" {
        out.push(ModifierSpec::Escape);
    } else if keyword == "t" {
        out.push(ModifierSpec::Transpose);
    } else if let Some(c) = FORMAT_RE.captures(text) {
        let conversion = match group(&c, 1).to_ascii_lowercase().as_str() {
            "fi" => FormatConversion::Int,
            "ff" => FormatConversion::Float,
            _ => FormatConversion::None,
        };
        out.push(ModifierSpec::Format {
            conversion,
            format: group(&c, 2).to_string(),
        });
    } else if let Some(c) = FLATTEN_RE.captures(text) {
        // `fl` alone spreads the list into separate arguments.
        if c.get(1).is_some() {
            out.push(ModifierSpec::Flatten {
                separator: group(&c, 2).to_string(),
            });
        } else {
            out.push(ModifierSpec::Transpose);
        }
    } else if let Some(c) = SUBPROCESS_RE.captures(text) {
        out.push(ModifierSpec::Subprocess(group(&c, 1).to_string()));
    } else if let Some(c) = INSERT_RE.captures(text) {
        let position = group(&c, 1)
            .parse::<usize>()
            .map_err(|_| SpecifierError::InvalidNumber(group(&c, 1).to_string()))?;
        out.push(ModifierSpec::InsertAt(position));
    } else if let Some(c) = SCRIPT_RE.captures(text) {
        out.push(ModifierSpec::ScriptHook {
            path: group(&c, 1).to_string(),
            argument: c.get(2).map(|m| m.as_str().to_string()),
        });
    } else if let Some(c) = REPLACE_RE.captures(text) {
        out.push(ModifierSpec::Replace {
            from: group(&c, 1).to_string(),
            to: group(&c, 2).to_string(),
        });
    } else if let Some(c) = REGEX_RE.captures(text) {
        let number = parse_group_number(group(&c, 2))?;
        let pattern = compile(group(&c, 3), true)?;
        match group(&c, 1).to_ascii_lowercase().as_str() {
            "rm" => out.push(ModifierSpec::FilterRegex(pattern)),
            "rs" => out.push(ModifierSpec::ExtractRegex {
                group: number,
                pattern,
            }),
            _ => {
                out.push(ModifierSpec::FilterRegex(pattern.clone()));
                out.push(ModifierSpec::ExtractRegex {
                    group: number,
                    pattern,
                });
            }
        }
    } else if let Some(c) = SLICE_RE.captures(text) {
        out.push(ModifierSpec::Slice {
            exclude: !group(&c, 1).is_empty(),
            slices: slices::parse_slice_list(group(&c, 2))?,
        });
    } else if let Some(c) = SPLIT_RE.captures(text) {
        out.push(ModifierSpec::Split(compile(group(&c, 1), false)?));
    } else if let Some(c) = SUBSTRING_RE.captures(text) {
        out.push(ModifierSpec::Substring(slices::parse_slice(group(&c, 1))?));
    } else if let Some(c) = STRIP_RE.captures(text) {
        let side = match group(&c, 1).to_ascii_lowercase().as_str() {
            "l" => StripSide::Left,
            "r" => StripSide::Right,
            _ => StripSide::Both,
        };
        out.push(ModifierSpec::Strip {
            side,
            chars: c.get(2).map(|m| m.as_str().to_string()),
        });
    } else if let Some(c) = WILDCARD_RE.captures(text) {
        let pattern = group(&c, 2);
        GlobBuilder::new(pattern)
            .build()
            .map_err(|source| SpecifierError::InvalidWildcard {
                pattern: pattern.to_string(),
                source,
            })?;
        out.push(ModifierSpec::Wildcard {
            inverted: c.get(1).is_some(),
            pattern: pattern.to_string(),
        });
    } else if let Some(c) = EXTRACT_ALL_RE.captures(text) {
        out.push(ModifierSpec::ExtractAll {
            group: parse_group_number(group(&c, 1))?,
            pattern: compile(group(&c, 2), true)?,
        });
    } else {
        return Err(SpecifierError::UnknownModifier(text.to_string()));
    }

    Ok(())
}
