// src/core/markers.rs

//! # Inline Marker Resolver
//!
//! Finds `%%...%%` / `$$...$$` markers in template tokens and binds each one to a
//! specifier index. Binding happens in a fixed order:
//!
//! 1. Explicit indices (`%%1%%`, `%%-1%%`) and inline declarations
//!    (`%%iapply-a,b%%`) bind while the tokens are scanned.
//! 2. Specifiers carrying `insert-at-index` are spliced in at their positions.
//! 3. Empty markers (`%%%%`) take the next unbound specifier, or wrap around
//!    over all specifiers once none is left.
//! 4. Whatever is still unbound is appended as trailing whole arguments.

use crate::constants::{DOLLAR_DELIMITER, MARKER_ESCAPE, PERCENT_DELIMITER};
use crate::core::error::{SpecifierError, TemplateError};
use crate::core::specifier_parser::parse_specifier;
use crate::models::{
    ArgumentSlot, ListSourceSpecifier, MarkerContent, ResolvedTemplate, SlotPiece, TemplatePiece,
};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use std::collections::VecDeque;

lazy_static! {
    // An optional escape, then `%%...%%` or `$$...$$` closed by the same delimiter.
    static ref MARKER_RE: Regex = Regex::new(r"(?s)(\\?)(?:%%(.*?)%%|\$\$(.*?)\$\$)").unwrap();
}

// --- SCANNING ---

/// Splits `token` into literal text and markers.
///
/// Returns `Ok(None)` when the token contains no marker syntax at all, so it can be
/// passed through untouched. Escaped markers come back as literal text with one
/// escape character removed.
pub fn scan_markers(token: &str) -> Result<Option<Vec<TemplatePiece>>, SpecifierError> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut changed = false;
    let mut last = 0;

    for captures in MARKER_RE.captures_iter(token) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        literal.push_str(token.get(last..whole.start()).unwrap_or_default());
        last = whole.end();

        let escaped = captures.get(1).is_some_and(|m| !m.is_empty());
        let (delimiter, content) = match (captures.get(2), captures.get(3)) {
            (Some(content), _) => (PERCENT_DELIMITER, content.as_str()),
            (None, Some(content)) => (DOLLAR_DELIMITER, content.as_str()),
            (None, None) => continue,
        };

        if escaped {
            // The escape only applies to text that would otherwise bind.
            if matches!(classify(content), Ok(None)) {
                literal.push(MARKER_ESCAPE);
            } else {
                changed = true;
            }
            push_raw_marker(&mut literal, delimiter, content);
            continue;
        }

        match classify(content)? {
            Some(marker) => {
                if !literal.is_empty() {
                    pieces.push(TemplatePiece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(TemplatePiece::Marker(marker));
                changed = true;
            }
            None => push_raw_marker(&mut literal, delimiter, content),
        }
    }

    if !changed {
        return Ok(None);
    }
    literal.push_str(token.get(last..).unwrap_or_default());
    if !literal.is_empty() {
        pieces.push(TemplatePiece::Literal(literal));
    }
    Ok(Some(pieces))
}

fn push_raw_marker(out: &mut String, delimiter: &str, content: &str) {
    out.push_str(delimiter);
    out.push_str(content);
    out.push_str(delimiter);
}

fn classify(content: &str) -> Result<Option<MarkerContent>, SpecifierError> {
    if content.is_empty() {
        return Ok(Some(MarkerContent::Sequential));
    }
    if let Ok(index) = content.trim().parse::<isize>() {
        return Ok(Some(MarkerContent::Index(index)));
    }
    Ok(parse_specifier(content)?.map(MarkerContent::Declared))
}

// --- BINDING ---

#[derive(Debug)]
enum PendingPiece {
    Literal(String),
    Bound(usize),
    Deferred,
}

#[derive(Debug)]
enum PendingSlot {
    Literal(String),
    Pieces { token: String, pieces: Vec<PendingPiece> },
}

/// Hands out specifier indices in declaration order, starting over at the end.
#[derive(Debug)]
struct SequentialCursor {
    next: usize,
    count: usize,
}

impl SequentialCursor {
    fn new(count: usize) -> Self {
        Self { next: 0, count }
    }

    fn advance(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let current = self.next;
        self.next = (self.next + 1) % self.count;
        Some(current)
    }
}

fn normalize_marker_index(index: isize, count: usize) -> Result<usize, TemplateError> {
    let out_of_range = || TemplateError::IndexOutOfRange { index, count };
    let count_signed = isize::try_from(count).map_err(|_| out_of_range())?;
    let absolute = if index < 0 { index + count_signed } else { index };
    usize::try_from(absolute)
        .ok()
        .filter(|position| *position < count)
        .ok_or_else(out_of_range)
}

fn mark_used(used: &mut [bool], index: usize) {
    if let Some(flag) = used.get_mut(index) {
        *flag = true;
    }
}

/// Binds every marker of `tokens` to a specifier.
///
/// Inline declarations are appended to `specifiers`. With `inline_markers` off,
/// every token is kept as a literal and all specifiers end up appended.
pub fn resolve_template(
    tokens: &[String],
    specifiers: &mut Vec<ListSourceSpecifier>,
    inline_markers: bool,
) -> Result<ResolvedTemplate, TemplateError> {
    let mut used = vec![false; specifiers.len()];
    let mut slots = Vec::with_capacity(tokens.len());

    for token in tokens {
        let scanned = if inline_markers {
            scan_markers(token)?
        } else {
            None
        };
        let Some(scanned) = scanned else {
            slots.push(PendingSlot::Literal(token.clone()));
            continue;
        };

        let mut pieces = Vec::with_capacity(scanned.len());
        for piece in scanned {
            match piece {
                TemplatePiece::Literal(text) => pieces.push(PendingPiece::Literal(text)),
                TemplatePiece::Marker(MarkerContent::Sequential) => {
                    pieces.push(PendingPiece::Deferred);
                }
                TemplatePiece::Marker(MarkerContent::Index(index)) => {
                    let position = normalize_marker_index(index, specifiers.len())?;
                    mark_used(&mut used, position);
                    pieces.push(PendingPiece::Bound(position));
                }
                TemplatePiece::Marker(MarkerContent::Declared(specifier)) => {
                    trace!("Inline specifier '{}' declared in '{}'.", specifier.original_token, token);
                    specifiers.push(specifier.without_insert_positions());
                    used.push(true);
                    pieces.push(PendingPiece::Bound(specifiers.len() - 1));
                }
            }
        }
        slots.push(PendingSlot::Pieces {
            token: token.clone(),
            pieces,
        });
    }

    // Fixed positions win over sequential binding.
    for (index, specifier) in specifiers.iter().enumerate() {
        let positions = specifier.insert_positions();
        if positions.is_empty() {
            continue;
        }
        mark_used(&mut used, index);
        for position in positions {
            let at = position.min(slots.len());
            debug!("Inserting list #{} at argument position {}.", index, at);
            slots.insert(
                at,
                PendingSlot::Pieces {
                    token: specifier.original_token.clone(),
                    pieces: vec![PendingPiece::Bound(index)],
                },
            );
        }
    }

    let mut unused: VecDeque<usize> = used
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(index, _)| index)
        .collect();
    let mut cursor = SequentialCursor::new(specifiers.len());

    for slot in slots.iter_mut() {
        let PendingSlot::Pieces { token, pieces } = slot else {
            continue;
        };
        for piece in pieces.iter_mut() {
            if !matches!(piece, PendingPiece::Deferred) {
                continue;
            }
            let index = match unused.pop_front() {
                Some(index) => index,
                None => cursor
                    .advance()
                    .ok_or_else(|| TemplateError::NoListForMarker(token.clone()))?,
            };
            *piece = PendingPiece::Bound(index);
        }
    }

    for index in unused {
        debug!("List #{} is unbound; appending it as a trailing argument.", index);
        slots.push(PendingSlot::Pieces {
            token: String::new(),
            pieces: vec![PendingPiece::Bound(index)],
        });
    }

    Ok(ResolvedTemplate {
        slots: slots.into_iter().map(finish_slot).collect(),
    })
}

fn finish_slot(slot: PendingSlot) -> ArgumentSlot {
    let pieces = match slot {
        PendingSlot::Literal(text) => return ArgumentSlot::Literal(text),
        PendingSlot::Pieces { pieces, .. } => pieces,
    };

    let mut finished: Vec<SlotPiece> = pieces
        .into_iter()
        .filter_map(|piece| match piece {
            PendingPiece::Literal(text) if text.is_empty() => None,
            PendingPiece::Literal(text) => Some(SlotPiece::Literal(text)),
            PendingPiece::Bound(index) => Some(SlotPiece::List(index)),
            // Every deferred piece is bound before slots are finished.
            PendingPiece::Deferred => None,
        })
        .collect();

    if finished.iter().all(|piece| matches!(piece, SlotPiece::Literal(_))) {
        let text = finished
            .into_iter()
            .map(|piece| match piece {
                SlotPiece::Literal(text) => text,
                SlotPiece::List(_) => String::new(),
            })
            .collect();
        return ArgumentSlot::Literal(text);
    }
    if finished.len() == 1 {
        if let Some(SlotPiece::List(index)) = finished.pop() {
            return ArgumentSlot::Whole(index);
        }
    }
    ArgumentSlot::Composite(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn specifiers(items: &[&str]) -> Vec<ListSourceSpecifier> {
        items
            .iter()
            .map(|t| parse_specifier(t).unwrap().unwrap())
            .collect()
    }

    fn resolve(template: &[&str], specs: &[&str]) -> Result<Vec<ArgumentSlot>, TemplateError> {
        let mut specs = specifiers(specs);
        resolve_template(&tokens(template), &mut specs, true).map(|t| t.slots)
    }

    #[test]
    fn test_scan_composite_token() {
        let pieces = scan_markers("prefix%%0%%suffix").unwrap().unwrap();
        assert_eq!(
            pieces,
            vec![
                TemplatePiece::Literal("prefix".to_string()),
                TemplatePiece::Marker(MarkerContent::Index(0)),
                TemplatePiece::Literal("suffix".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_both_delimiters_but_not_mixed() {
        assert_eq!(
            scan_markers("$$$$").unwrap().unwrap(),
            vec![TemplatePiece::Marker(MarkerContent::Sequential)]
        );
        assert_eq!(
            scan_markers("$$-1$$").unwrap().unwrap(),
            vec![TemplatePiece::Marker(MarkerContent::Index(-1))]
        );
        assert!(scan_markers("%%0$$").unwrap().is_none());
        assert!(scan_markers("plain").unwrap().is_none());
    }

    #[test]
    fn test_scan_escape_drops_one_escape_character() {
        assert_eq!(
            scan_markers("\\%%0%%").unwrap().unwrap(),
            vec![TemplatePiece::Literal("%%0%%".to_string())]
        );
        assert_eq!(
            scan_markers("\\\\%%%%").unwrap().unwrap(),
            vec![TemplatePiece::Literal("\\%%%%".to_string())]
        );
    }

    #[test]
    fn test_scan_unrecognized_content_stays_literal() {
        assert!(scan_markers("100%%hello%%").unwrap().is_none());
    }

    #[test]
    fn test_scan_escape_before_non_marker_is_kept() {
        assert!(scan_markers("\\%%hello%%").unwrap().is_none());
        assert_eq!(
            scan_markers("\\$$hello$$%%%%").unwrap().unwrap(),
            vec![
                TemplatePiece::Literal("\\$$hello$$".to_string()),
                TemplatePiece::Marker(MarkerContent::Sequential),
            ]
        );
    }

    #[test]
    fn test_scan_inline_declaration() {
        let pieces = scan_markers("%%iapply-a,b%%").unwrap().unwrap();
        assert!(matches!(
            &pieces[0],
            TemplatePiece::Marker(MarkerContent::Declared(spec)) if spec.kind == SourceKind::InlineCsv
        ));
        assert!(scan_markers("%%iapply+[zz]-a%%").is_err());
    }

    #[test]
    fn test_sequential_markers_bind_in_declaration_order() {
        let slots = resolve(&["echo", "%%%%", "%%%%"], &["iapply-a", "iapply-b", "iapply-c"]).unwrap();
        assert_eq!(
            slots,
            vec![
                ArgumentSlot::Literal("echo".to_string()),
                ArgumentSlot::Whole(0),
                ArgumentSlot::Whole(1),
                ArgumentSlot::Whole(2),
            ]
        );
    }

    #[test]
    fn test_sequential_markers_wrap_when_exhausted() {
        let slots = resolve(&["%%%%", "%%%%", "%%%%"], &["iapply-a", "iapply-b"]).unwrap();
        assert_eq!(
            slots,
            vec![
                ArgumentSlot::Whole(0),
                ArgumentSlot::Whole(1),
                ArgumentSlot::Whole(0),
            ]
        );
    }

    #[test]
    fn test_explicit_index_claims_specifier() {
        let slots = resolve(&["%%-1%%", "x%%%%y"], &["iapply-a", "iapply-b"]).unwrap();
        assert_eq!(
            slots,
            vec![
                ArgumentSlot::Whole(1),
                ArgumentSlot::Composite(vec![
                    SlotPiece::Literal("x".to_string()),
                    SlotPiece::List(0),
                    SlotPiece::Literal("y".to_string()),
                ]),
            ]
        );
    }

    #[test]
    fn test_explicit_index_out_of_range() {
        assert!(matches!(
            resolve(&["%%2%%"], &["iapply-a"]),
            Err(TemplateError::IndexOutOfRange { index: 2, count: 1 })
        ));
    }

    #[test]
    fn test_inline_declaration_is_appended_and_bound() {
        let mut specs = specifiers(&["iapply-a"]);
        let template = resolve_template(&tokens(&["%%iapply+[i:0]-x,y%%"]), &mut specs, true).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs[1].insert_positions().is_empty());
        assert_eq!(
            template.slots,
            vec![ArgumentSlot::Whole(1), ArgumentSlot::Whole(0)]
        );
    }

    #[test]
    fn test_insert_at_index_wins_over_sequential_binding() {
        let slots = resolve(&["a", "b"], &["iapply+[i:1]-x,y"]).unwrap();
        assert_eq!(
            slots,
            vec![
                ArgumentSlot::Literal("a".to_string()),
                ArgumentSlot::Whole(0),
                ArgumentSlot::Literal("b".to_string()),
            ]
        );

        let slots = resolve(&["%%%%"], &["iapply+[i:9]-x", "iapply-y"]).unwrap();
        assert_eq!(slots, vec![ArgumentSlot::Whole(1), ArgumentSlot::Whole(0)]);
    }

    #[test]
    fn test_marker_without_any_specifier() {
        assert!(matches!(
            resolve(&["%%%%"], &[]),
            Err(TemplateError::NoListForMarker(_))
        ));
    }

    #[test]
    fn test_disabled_inline_markers_keep_tokens() {
        let mut specs = specifiers(&["iapply-a"]);
        let template = resolve_template(&tokens(&["%%%%"]), &mut specs, false).unwrap();
        assert_eq!(
            template.slots,
            vec![ArgumentSlot::Literal("%%%%".to_string()), ArgumentSlot::Whole(0)]
        );
    }
}
