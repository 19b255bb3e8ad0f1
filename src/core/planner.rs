// src/core/planner.rs

//! # Planner
//!
//! Runs one complete templating pass: policy validation, marker binding,
//! reference resolution, list loading, modifiers, alignment and expansion. Any
//! error aborts the whole pass, so a returned [`RunPlan`] is always complete.

use crate::core::alignment::AlignmentPolicy;
use crate::core::error::TemplateError;
use crate::core::expansion::expand;
use crate::core::markers::resolve_template;
use crate::core::modifiers::apply_modifiers;
use crate::core::references::resolve_references;
use crate::core::sources::{ListSources, load_raw_list};
use crate::models::{ListSourceSpecifier, ResolvedList, RunPlan, TemplateOptions};
use log::{debug, warn};

/// Builds the [`RunPlan`] for `template` over `specifiers`.
///
/// `specifiers` are the ones declared outside the template, in declaration order;
/// inline declarations found in the template are appended after them.
pub fn build_run_plan(
    template: &[String],
    specifiers: Vec<ListSourceSpecifier>,
    options: &TemplateOptions,
    sources: &mut dyn ListSources,
) -> Result<RunPlan, TemplateError> {
    let policy = AlignmentPolicy::from_options(&options.alignment)?;

    let mut specifiers = specifiers;
    let resolved = resolve_template(template, &mut specifiers, options.inline_markers)?;

    if specifiers.is_empty() {
        debug!("No lists declared; planning {} literal run(s).", policy.repeat());
        return expand(&resolved, &[], policy.repeat());
    }

    let recipes = resolve_references(&specifiers)?;

    let mut raw_lists: Vec<Option<Vec<String>>> = vec![None; specifiers.len()];
    for (index, specifier) in specifiers.iter().enumerate() {
        if specifier.kind.duplicate_target().is_some() {
            continue;
        }
        let values = match load_raw_list(specifier, sources) {
            Ok(values) => values,
            Err(err) if err.degrades_to_empty() => {
                warn!("{}; list #{} is empty.", err, index);
                Vec::new()
            }
            Err(source) => return Err(TemplateError::Source { index, source }),
        };
        debug!(
            "Loaded list #{} ('{}'): {} element(s).",
            index,
            specifier.original_token,
            values.len()
        );
        if values.is_empty() {
            return Err(TemplateError::EmptySource {
                index,
                token: specifier.original_token.clone(),
            });
        }
        if let Some(slot) = raw_lists.get_mut(index) {
            *slot = Some(values);
        }
    }

    let mut lists = Vec::with_capacity(specifiers.len());
    for (index, (specifier, recipe)) in specifiers.iter().zip(&recipes).enumerate() {
        let raw = raw_lists
            .get(recipe.root)
            .cloned()
            .flatten()
            .unwrap_or_default();
        let values = apply_modifiers(raw, &recipe.modifiers, specifier, sources)
            .map_err(|source| TemplateError::Modifier { index, source })?;
        // Transposed lists skip alignment, so an empty one would go unnoticed there.
        if values.is_empty() {
            return Err(TemplateError::EmptySource {
                index,
                token: specifier.original_token.clone(),
            });
        }
        lists.push(ResolvedList {
            values,
            transposed: specifier.is_transposed(),
        });
    }

    let run_count = policy.align(&mut lists);
    if run_count == 0 {
        return Err(TemplateError::EmptySource {
            index: 0,
            token: specifiers
                .first()
                .map(|s| s.original_token.clone())
                .unwrap_or_default(),
        });
    }

    let plan = expand(&resolved, &lists, run_count)?;
    debug!("Planned {} run(s).", plan.len());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sources::MemorySources;
    use crate::core::specifier_parser::parse_specifier;
    use crate::models::AlignmentOptions;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn specifiers(items: &[&str]) -> Vec<ListSourceSpecifier> {
        items
            .iter()
            .map(|t| parse_specifier(t).unwrap().unwrap())
            .collect()
    }

    fn plan(
        template: &[&str],
        specs: &[&str],
        options: TemplateOptions,
        sources: &mut MemorySources,
    ) -> Result<Vec<Vec<String>>, TemplateError> {
        build_run_plan(&tokens(template), specifiers(specs), &options, sources).map(RunPlan::into_runs)
    }

    #[test]
    fn test_no_lists_repeats_literal_template() {
        let options = TemplateOptions {
            alignment: AlignmentOptions {
                repeat: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        let runs = plan(&["ping", "host"], &[], options, &mut MemorySources::new()).unwrap();
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r == &tokens(&["ping", "host"])));

        let runs = plan(&["ls"], &[], TemplateOptions::default(), &mut MemorySources::new()).unwrap();
        assert_eq!(runs, vec![tokens(&["ls"])]);
    }

    #[test]
    fn test_unused_lists_are_appended_in_declaration_order() {
        let runs = plan(
            &["diff"],
            &["iapply-a1,a2", "iapply-b1,b2"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap();
        assert_eq!(
            runs,
            vec![tokens(&["diff", "a1", "b1"]), tokens(&["diff", "a2", "b2"])]
        );
    }

    #[test]
    fn test_duplicate_copies_raw_list() {
        let runs = plan(
            &["mv", "%%0%%", "%%1%%"],
            &["iapply+[f:%s.txt]-a,b", "dapply+[f:%s.bak]-0"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap();
        assert_eq!(
            runs,
            vec![
                tokens(&["mv", "a.txt", "a.bak"]),
                tokens(&["mv", "b.txt", "b.bak"])
            ]
        );
    }

    #[test]
    fn test_duplicate_with_modifiers_replays_chain() {
        let runs = plan(
            &["echo"],
            &["iapply+[f:<%s>]-a", "dmapply+[f:[%s]]-0"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap();
        assert_eq!(runs, vec![tokens(&["echo", "<a>", "[<a>]"])]);
    }

    #[test]
    fn test_conflicting_policy_is_reported_before_loading() {
        let options = TemplateOptions {
            alignment: AlignmentOptions {
                repeat: Some(2),
                cross_join: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = plan(&["x"], &["fapply-missing"], options, &mut MemorySources::new()).unwrap_err();
        assert!(matches!(err, TemplateError::ConflictingPolicy(_)));
    }

    #[test]
    fn test_network_failure_becomes_empty_source() {
        let err = plan(
            &["curl"],
            &["happly-http://unreachable.invalid/list"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::EmptySource { index: 0, .. }));
    }

    #[test]
    fn test_file_failure_is_fatal() {
        let err = plan(
            &["cat"],
            &["fapply-nope.txt"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Source { index: 0, .. }));
    }

    #[test]
    fn test_list_emptied_by_modifier_is_empty_source() {
        let err = plan(
            &["echo"],
            &["iapply-a,b", "iapply+[rm:zzz]-c,d"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::EmptySource { index: 1, .. }));
    }

    #[test]
    fn test_failed_subprocess_in_transposed_list_is_empty_source() {
        let err = plan(
            &["echo", "%%0%%", "%%1%%"],
            &["iapply+[g:missing]+[t]-a", "iapply-x,y"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::EmptySource { index: 0, .. }));
    }

    #[test]
    fn test_transposed_list_emptied_by_filter_is_empty_source() {
        let err = plan(
            &["echo", "%%0%%", "%%1%%"],
            &["iapply+[rm:zzz]+[t]-a", "iapply-x"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::EmptySource { index: 0, .. }));
    }

    #[test]
    fn test_modifier_failure_names_the_list() {
        let err = plan(
            &["echo"],
            &["iapply-1", "iapply+[fi:%d]-x"],
            TemplateOptions::default(),
            &mut MemorySources::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Modifier { index: 1, .. }));
    }
}
