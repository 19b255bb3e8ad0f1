// src/core/references.rs

//! Resolves `DuplicateOf` / `DuplicateWithModifiersOf` back-references over the
//! flat specifier arena, so that every specifier knows which raw list it starts
//! from and which modifier chain it runs.

use crate::core::error::TemplateError;
use crate::models::{ListSourceSpecifier, ModifierSpec, SourceKind};

/// How one specifier's list is produced once references are followed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRecipe {
    /// Index of the non-duplicate specifier whose raw list is used.
    pub root: usize,
    /// The effective modifier chain, in execution order.
    pub modifiers: Vec<ModifierSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// Builds one [`ListRecipe`] per specifier.
///
/// Negative references count from the end of the arena. A reference to itself,
/// to a missing index or around a cycle is an error.
pub fn resolve_references(
    specifiers: &[ListSourceSpecifier],
) -> Result<Vec<ListRecipe>, TemplateError> {
    let count = specifiers.len();
    let mut targets = Vec::with_capacity(count);
    for (index, specifier) in specifiers.iter().enumerate() {
        let target = match specifier.kind.duplicate_target() {
            Some(reference) => Some(normalize(index, reference, count)?),
            None => None,
        };
        targets.push(target);
    }

    let mut resolver = Resolver {
        specifiers,
        targets: &targets,
        visits: vec![Visit::Pending; count],
        recipes: vec![None; count],
    };
    (0..count).map(|index| resolver.recipe(index)).collect()
}

fn normalize(index: usize, reference: isize, count: usize) -> Result<usize, TemplateError> {
    let invalid = || TemplateError::InvalidReference { index, reference };
    let count_signed = isize::try_from(count).map_err(|_| invalid())?;
    let absolute = if reference < 0 {
        reference + count_signed
    } else {
        reference
    };
    let target = usize::try_from(absolute).map_err(|_| invalid())?;
    if target >= count || target == index {
        return Err(invalid());
    }
    Ok(target)
}

struct Resolver<'a> {
    specifiers: &'a [ListSourceSpecifier],
    targets: &'a [Option<usize>],
    visits: Vec<Visit>,
    recipes: Vec<Option<ListRecipe>>,
}

impl Resolver<'_> {
    fn recipe(&mut self, index: usize) -> Result<ListRecipe, TemplateError> {
        match self.visits.get(index) {
            Some(Visit::Done) => {
                if let Some(Some(recipe)) = self.recipes.get(index) {
                    return Ok(recipe.clone());
                }
            }
            Some(Visit::InProgress) => return Err(TemplateError::ReferenceCycle(index)),
            _ => {}
        }
        self.set_visit(index, Visit::InProgress);

        let specifiers = self.specifiers;
        let specifier = specifiers
            .get(index)
            .ok_or(TemplateError::ReferenceCycle(index))?;
        let own = specifier.modifiers.clone();

        let recipe = match self.targets.get(index).copied().flatten() {
            None => ListRecipe {
                root: index,
                modifiers: own,
            },
            Some(target) => {
                let referent = self.recipe(target)?;
                let modifiers = if matches!(specifier.kind, SourceKind::DuplicateWithModifiersOf(_)) {
                    referent
                        .modifiers
                        .into_iter()
                        .filter(ModifierSpec::transforms_list)
                        .chain(own)
                        .collect()
                } else {
                    own
                };
                ListRecipe {
                    root: referent.root,
                    modifiers,
                }
            }
        };

        self.set_visit(index, Visit::Done);
        if let Some(slot) = self.recipes.get_mut(index) {
            *slot = Some(recipe.clone());
        }
        Ok(recipe)
    }

    fn set_visit(&mut self, index: usize, visit: Visit) {
        if let Some(slot) = self.visits.get_mut(index) {
            *slot = visit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::specifier_parser::parse_specifier;

    fn specifiers(tokens: &[&str]) -> Vec<ListSourceSpecifier> {
        tokens
            .iter()
            .map(|t| parse_specifier(t).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_plain_specifiers_are_their_own_root() {
        let recipes = resolve_references(&specifiers(&["iapply-a", "iapply+[e]-b"])).unwrap();
        assert_eq!(recipes[0].root, 0);
        assert_eq!(recipes[1].root, 1);
        assert_eq!(recipes[1].modifiers, vec![ModifierSpec::Escape]);
    }

    #[test]
    fn test_duplicate_gets_none_of_the_referent_modifiers() {
        let recipes =
            resolve_references(&specifiers(&["iapply+[e]-a", "dapply+[fl:,]-0"])).unwrap();
        assert_eq!(recipes[1].root, 0);
        assert_eq!(
            recipes[1].modifiers,
            vec![ModifierSpec::Flatten {
                separator: ",".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_with_modifiers_prepends_transform_chain() {
        let recipes =
            resolve_references(&specifiers(&["iapply+[e]+[t]-a", "dmapply+[fl:,]-0"])).unwrap();
        assert_eq!(
            recipes[1].modifiers,
            vec![
                ModifierSpec::Escape,
                ModifierSpec::Flatten {
                    separator: ",".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_chains_follow_to_the_root() {
        let recipes = resolve_references(&specifiers(&["iapply-a", "-3", "1"])).unwrap();
        assert_eq!(recipes[1].root, 0);
        assert_eq!(recipes[2].root, 0);
    }

    #[test]
    fn test_self_and_missing_references_are_rejected() {
        assert!(matches!(
            resolve_references(&specifiers(&["iapply-a", "1"])),
            Err(TemplateError::InvalidReference { index: 1, reference: 1 })
        ));
        assert!(matches!(
            resolve_references(&specifiers(&["iapply-a", "5"])),
            Err(TemplateError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_cycles_are_rejected() {
        assert!(matches!(
            resolve_references(&specifiers(&["1", "0"])),
            Err(TemplateError::ReferenceCycle(_))
        ));
    }
}
