// src/core/slices.rs

//! A small interpreter for `start:stop:step` slice descriptors with negative,
//! from-the-end indices and open bounds.

use crate::core::error::SpecifierError;
use crate::models::SliceSpec;

/// Parses one slice expression: `N`, `A:B`, `A:B:C`, any part may be empty.
pub fn parse_slice(text: &str) -> Result<SliceSpec, SpecifierError> {
    let invalid = || SpecifierError::InvalidSlice(text.to_string());

    let parts: Vec<&str> = text.split(':').collect();
    if text.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let parse_part = |part: &str| -> Result<Option<i64>, SpecifierError> {
        let part = part.trim();
        if part.is_empty() {
            Ok(None)
        } else {
            part.parse::<i64>().map(Some).map_err(|_| invalid())
        }
    };

    match parts.as_slice() {
        [index] => parse_part(index)?.map(SliceSpec::Index).ok_or_else(invalid),
        [start, stop] => Ok(SliceSpec::Range {
            start: parse_part(start)?,
            stop: parse_part(stop)?,
            step: None,
        }),
        [start, stop, step] => {
            let step = parse_part(step)?;
            if step == Some(0) {
                return Err(invalid());
            }
            Ok(SliceSpec::Range {
                start: parse_part(start)?,
                stop: parse_part(stop)?,
                step,
            })
        }
        _ => Err(invalid()),
    }
}

/// Parses a comma-separated list of slice expressions.
pub fn parse_slice_list(text: &str) -> Result<Vec<SliceSpec>, SpecifierError> {
    text.split(',').map(parse_slice).collect()
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_usize(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Returns the indices a slice selects from a sequence of `len` elements, in slice order.
pub fn selected_indices(slice: &SliceSpec, len: usize) -> Vec<usize> {
    let len = to_i64(len);
    match *slice {
        SliceSpec::Index(index) => {
            let normalized = if index < 0 { index + len } else { index };
            if (0..len).contains(&normalized) {
                to_usize(normalized).into_iter().collect()
            } else {
                Vec::new()
            }
        }
        SliceSpec::Range { start, stop, step } => {
            let step = step.unwrap_or(1);
            if step == 0 {
                return Vec::new();
            }
            // Clamp the bounds the same way sequence slicing does.
            let clamp = |bound: Option<i64>, default: i64| -> i64 {
                match bound {
                    None => default,
                    Some(value) if value < 0 => {
                        let shifted = value + len;
                        if shifted < 0 {
                            if step < 0 { -1 } else { 0 }
                        } else {
                            shifted
                        }
                    }
                    Some(value) if value >= len => {
                        if step < 0 {
                            len - 1
                        } else {
                            len
                        }
                    }
                    Some(value) => value,
                }
            };

            let (start, stop) = if step > 0 {
                (clamp(start, 0), clamp(stop, len))
            } else {
                (clamp(start, len - 1), clamp(stop, -1))
            };

            let mut indices = Vec::new();
            let mut current = start;
            while (step > 0 && current < stop) || (step < 0 && current > stop) {
                if let Some(index) = to_usize(current) {
                    indices.push(index);
                }
                current += step;
            }
            indices
        }
    }
}

/// Selects the elements chosen by `slices`, or drops them when `exclude` is set.
///
/// Selection concatenates each slice's elements in the order the slices are given.
/// Exclusion removes every chosen index and keeps the rest in their original order.
pub fn apply_slices(values: &[String], slices: &[SliceSpec], exclude: bool) -> Vec<String> {
    if values.is_empty() {
        return Vec::new();
    }

    if exclude {
        let mut removed = vec![false; values.len()];
        for slice in slices {
            for index in selected_indices(slice, values.len()) {
                if let Some(flag) = removed.get_mut(index) {
                    *flag = true;
                }
            }
        }
        values
            .iter()
            .zip(removed)
            .filter(|(_, removed)| !removed)
            .map(|(value, _)| value.clone())
            .collect()
    } else {
        slices
            .iter()
            .flat_map(|slice| selected_indices(slice, values.len()))
            .filter_map(|index| values.get(index).cloned())
            .collect()
    }
}

/// Applies a slice to the characters of `text`.
pub fn slice_chars(text: &str, slice: &SliceSpec) -> String {
    let chars: Vec<char> = text.chars().collect();
    selected_indices(slice, chars.len())
        .into_iter()
        .filter_map(|index| chars.get(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_slice_forms() {
        assert_eq!(parse_slice("2").unwrap(), SliceSpec::Index(2));
        assert_eq!(parse_slice("-1").unwrap(), SliceSpec::Index(-1));
        assert_eq!(
            parse_slice("1:").unwrap(),
            SliceSpec::Range {
                start: Some(1),
                stop: None,
                step: None
            }
        );
        assert_eq!(
            parse_slice("::-1").unwrap(),
            SliceSpec::Range {
                start: None,
                stop: None,
                step: Some(-1)
            }
        );
    }

    #[test]
    fn test_parse_slice_rejects_garbage() {
        assert!(parse_slice("").is_err());
        assert!(parse_slice("a").is_err());
        assert!(parse_slice("1:2:3:4").is_err());
        assert!(parse_slice("::0").is_err());
        assert!(parse_slice_list("1,,2").is_err());
    }

    #[test]
    fn test_select_concatenates_in_given_order() {
        let values = list(&["a", "b", "c", "d", "e"]);
        let slices = parse_slice_list("-1,0:2").unwrap();
        assert_eq!(apply_slices(&values, &slices, false), list(&["e", "a", "b"]));
    }

    #[test]
    fn test_exclude_preserves_remaining_order() {
        let values = list(&["a", "b", "c", "d", "e"]);
        let slices = parse_slice_list("-1,0:2").unwrap();
        assert_eq!(apply_slices(&values, &slices, true), list(&["c", "d"]));
    }

    #[test]
    fn test_out_of_range_selects_nothing() {
        let values = list(&["a", "b"]);
        assert!(apply_slices(&values, &[SliceSpec::Index(5)], false).is_empty());
        assert_eq!(apply_slices(&values, &[SliceSpec::Index(5)], true), values);
    }

    #[test]
    fn test_negative_step_and_clamping() {
        assert_eq!(selected_indices(&parse_slice("::-1").unwrap(), 4), vec![3, 2, 1, 0]);
        assert_eq!(selected_indices(&parse_slice("-10:10").unwrap(), 3), vec![0, 1, 2]);
        assert_eq!(selected_indices(&parse_slice("::2").unwrap(), 5), vec![0, 2, 4]);
        assert!(selected_indices(&parse_slice("3:1").unwrap(), 5).is_empty());
    }

    #[test]
    fn test_slice_chars() {
        assert_eq!(slice_chars("report.txt", &parse_slice(":-4").unwrap()), "report");
        assert_eq!(slice_chars("abc", &parse_slice("-1").unwrap()), "c");
        assert_eq!(slice_chars("abc", &parse_slice("7").unwrap()), "");
    }
}
