// src/core/alignment.rs

//! # Alignment Engine
//!
//! Brings every non-transposed list to one common length `N`. The steps always
//! run in the same order: repeat tiling, rollover, cross-join, and a closing
//! truncate-to-minimum that guarantees the lengths agree.

use crate::core::error::TemplateError;
use crate::models::{AlignmentOptions, ResolvedList, RolloverFill};
use log::debug;

/// The validated, global length policy for one templating pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentPolicy {
    repeat: usize,
    rollover: Option<RolloverFill>,
    cross_join: bool,
}

impl AlignmentPolicy {
    /// Validates the switches. Cross-join cannot be combined with repeat or rollover.
    pub fn from_options(options: &AlignmentOptions) -> Result<Self, TemplateError> {
        if options.cross_join && (options.repeat.is_some() || options.rollover.is_some()) {
            return Err(TemplateError::ConflictingPolicy(
                "/crossjoin cannot be used with /rollover or /repeat".to_string(),
            ));
        }
        Ok(Self {
            repeat: options.repeat.unwrap_or(1),
            rollover: options.rollover,
            cross_join: options.cross_join,
        })
    }

    /// The repeat count; `1` when no repeat was requested.
    pub fn repeat(&self) -> usize {
        self.repeat
    }

    /// Aligns `lists` in place and returns the common length `N`.
    ///
    /// Transposed lists are left untouched. When no list takes part, `N` is the
    /// repeat count.
    pub fn align(&self, lists: &mut [ResolvedList]) -> usize {
        let mut aligned: Vec<&mut Vec<String>> = lists
            .iter_mut()
            .filter(|list| !list.transposed)
            .map(|list| &mut list.values)
            .collect();

        if aligned.is_empty() {
            return self.repeat.max(1);
        }

        if self.repeat >= 2 {
            for values in aligned.iter_mut() {
                let target = values.len().saturating_mul(self.repeat);
                tile(values, target);
            }
        }

        if let Some(fill) = self.rollover {
            let longest = aligned.iter().map(|v| v.len()).max().unwrap_or(0);
            for values in aligned.iter_mut() {
                match fill {
                    RolloverFill::Repeat => tile(values, longest),
                    RolloverFill::Blank => values.resize(longest, String::new()),
                }
            }
        }

        if self.cross_join {
            let columns = cross_join(&aligned.iter().map(|v| v.as_slice()).collect::<Vec<_>>());
            for (values, column) in aligned.iter_mut().zip(columns) {
                **values = column;
            }
        }

        let shortest = aligned.iter().map(|v| v.len()).min().unwrap_or(0);
        for values in aligned.iter_mut() {
            values.truncate(shortest);
        }

        debug!(
            "Aligned {} list(s) to length {} (repeat: {}, rollover: {:?}, crossjoin: {}).",
            aligned.len(),
            shortest,
            self.repeat,
            self.rollover,
            self.cross_join
        );
        shortest
    }
}

/// Extends `values` with copies of its own elements until it reaches `target`.
/// An empty list stays empty.
fn tile(values: &mut Vec<String>, target: usize) {
    let original = values.len();
    if original == 0 {
        return;
    }
    let mut next = 0;
    while values.len() < target {
        let Some(value) = values.get(next % original).cloned() else {
            break;
        };
        values.push(value);
        next += 1;
    }
}

/// Returns one column per input: the per-list projections of the Cartesian
/// product, enumerated with the first list as the slowest-varying one.
fn cross_join(lists: &[&[String]]) -> Vec<Vec<String>> {
    let total = lists.iter().fold(1usize, |acc, l| acc.saturating_mul(l.len()));
    let mut columns: Vec<Vec<String>> = lists.iter().map(|_| Vec::with_capacity(total)).collect();

    for row in 0..total {
        let mut remainder = row;
        // Walk from the last list (fastest) to the first (slowest).
        for (list, column) in lists.iter().zip(columns.iter_mut()).rev() {
            let len = list.len();
            if let Some(value) = list.get(remainder % len) {
                column.push(value.clone());
            }
            remainder /= len;
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(items: &[&str]) -> ResolvedList {
        ResolvedList {
            values: items.iter().map(|s| s.to_string()).collect(),
            transposed: false,
        }
    }

    fn values(list: &ResolvedList) -> Vec<&str> {
        list.values.iter().map(String::as_str).collect()
    }

    fn policy(options: AlignmentOptions) -> AlignmentPolicy {
        AlignmentPolicy::from_options(&options).unwrap()
    }

    #[test]
    fn test_truncate_to_minimum_is_idempotent() {
        let mut lists = vec![resolved(&["a", "b", "c"]), resolved(&["x", "y"])];
        let default = policy(AlignmentOptions::default());
        assert_eq!(default.align(&mut lists), 2);
        assert_eq!(values(&lists[0]), vec!["a", "b"]);
        let before = lists.clone();
        assert_eq!(default.align(&mut lists), 2);
        assert_eq!(lists, before);
    }

    #[test]
    fn test_repeat_tiles_before_truncation() {
        let mut lists = vec![resolved(&["a", "b"]), resolved(&["x", "y", "z"])];
        let n = policy(AlignmentOptions {
            repeat: Some(2),
            ..Default::default()
        })
        .align(&mut lists);
        assert_eq!(n, 4);
        assert_eq!(values(&lists[0]), vec!["a", "b", "a", "b"]);
        assert_eq!(values(&lists[1]), vec!["x", "y", "z", "x"]);
    }

    #[test]
    fn test_rollover_repeats_own_elements() {
        let mut lists = vec![
            resolved(&["v0", "v1"]),
            resolved(&["1", "2", "3", "4", "5"]),
        ];
        let n = policy(AlignmentOptions {
            rollover: Some(RolloverFill::Repeat),
            ..Default::default()
        })
        .align(&mut lists);
        assert_eq!(n, 5);
        assert_eq!(values(&lists[0]), vec!["v0", "v1", "v0", "v1", "v0"]);
    }

    #[test]
    fn test_rollover_blank_pads_with_empty_strings() {
        let mut lists = vec![resolved(&["a"]), resolved(&["1", "2", "3"])];
        policy(AlignmentOptions {
            rollover: Some(RolloverFill::Blank),
            ..Default::default()
        })
        .align(&mut lists);
        assert_eq!(values(&lists[0]), vec!["a", "", ""]);
    }

    #[test]
    fn test_cross_join_is_first_list_major() {
        let mut lists = vec![resolved(&["a", "b"]), resolved(&["x", "y", "z"])];
        let n = policy(AlignmentOptions {
            cross_join: true,
            ..Default::default()
        })
        .align(&mut lists);
        assert_eq!(n, 6);
        assert_eq!(values(&lists[0]), vec!["a", "a", "a", "b", "b", "b"]);
        assert_eq!(values(&lists[1]), vec!["x", "y", "z", "x", "y", "z"]);
    }

    #[test]
    fn test_transposed_lists_do_not_take_part() {
        let mut lists = vec![
            resolved(&["a", "b", "c"]),
            ResolvedList {
                values: vec!["t".to_string()],
                transposed: true,
            },
        ];
        assert_eq!(policy(AlignmentOptions::default()).align(&mut lists), 3);
        assert_eq!(lists[1].values, vec!["t".to_string()]);
    }

    #[test]
    fn test_empty_list_yields_zero_runs() {
        let mut lists = vec![resolved(&[]), resolved(&["a"])];
        let n = policy(AlignmentOptions {
            rollover: Some(RolloverFill::Repeat),
            ..Default::default()
        })
        .align(&mut lists);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_conflicting_policies_are_rejected() {
        let err = AlignmentPolicy::from_options(&AlignmentOptions {
            repeat: Some(2),
            cross_join: true,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, TemplateError::ConflictingPolicy(_)));
        assert!(
            AlignmentPolicy::from_options(&AlignmentOptions {
                repeat: Some(2),
                rollover: Some(RolloverFill::Blank),
                cross_join: false,
            })
            .is_ok()
        );
    }
}
