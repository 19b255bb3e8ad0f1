// src/core/expansion.rs

//! # Expansion Engine
//!
//! Produces the concrete argument vectors of a [`RunPlan`] from a resolved
//! template and the aligned lists.

use crate::core::commons::join_for_shell;
use crate::core::error::TemplateError;
use crate::models::{ArgumentSlot, ResolvedList, ResolvedTemplate, RunPlan, SlotPiece};

fn list_at(lists: &[ResolvedList], index: usize) -> Result<&ResolvedList, TemplateError> {
    lists.get(index).ok_or(TemplateError::IndexOutOfRange {
        index: isize::try_from(index).unwrap_or(isize::MAX),
        count: lists.len(),
    })
}

/// Expands `template` into `run_count` argument vectors.
///
/// A non-transposed list contributes its `i`-th element to run `i`. A transposed
/// list contributes its whole contents to every run: as adjacent arguments when it
/// fills a slot on its own, or shell-joined inside a composite argument.
pub fn expand(
    template: &ResolvedTemplate,
    lists: &[ResolvedList],
    run_count: usize,
) -> Result<RunPlan, TemplateError> {
    let mut runs = Vec::with_capacity(run_count);

    for run in 0..run_count {
        let mut arguments = Vec::with_capacity(template.slots.len());
        for slot in &template.slots {
            match slot {
                ArgumentSlot::Literal(text) => arguments.push(text.clone()),
                ArgumentSlot::Whole(index) => {
                    let list = list_at(lists, *index)?;
                    if list.transposed {
                        arguments.extend(list.values.iter().cloned());
                    } else {
                        arguments.push(list.values.get(run).cloned().unwrap_or_default());
                    }
                }
                ArgumentSlot::Composite(pieces) => {
                    let mut argument = String::new();
                    for piece in pieces {
                        match piece {
                            SlotPiece::Literal(text) => argument.push_str(text),
                            SlotPiece::List(index) => {
                                let list = list_at(lists, *index)?;
                                if list.transposed {
                                    let joined = join_for_shell(&list.values)
                                        .ok_or(TemplateError::Quote(*index))?;
                                    argument.push_str(&joined);
                                } else if let Some(value) = list.values.get(run) {
                                    argument.push_str(value);
                                }
                            }
                        }
                    }
                    arguments.push(argument);
                }
            }
        }
        runs.push(arguments);
    }

    Ok(RunPlan::new(runs))
}
