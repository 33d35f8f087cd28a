//! Aggregator: merges per-variant evaluation trees into one.
//!
//! Each attribute supplies its own merge function. The default is
//! [`pick_worst`], which applies a fixed override order:
//!
//! 1. `FAIL` overrides everything
//! 2. `PARTIAL` overrides everything but `FAIL`
//! 3. `PASS` overrides `UNRATED` and `EXEMPT`
//! 4. `UNRATED` overrides `EXEMPT`
//!
//! Ties go to the first variant in canonical order, so the merge depends
//! only on the contents of the map and never on how it was built.

use std::collections::BTreeSet;

use crate::attributes::AttributeRegistry;
use crate::types::{EvaluatedGroup, Evaluation, EvaluationTree, Rating, VariantMap};
use crate::RatingError;

/// Default merge: the evaluation hardest to override, cloned unchanged.
///
/// `EXEMPT` is the weakest rating, so it survives only when every variant
/// is exempt. Exemptions depend on the wallet profile alone and therefore
/// apply to all variants at once; a map mixing `EXEMPT` with other ratings
/// merges to the non-exempt evaluation.
///
/// Returns `None` only for an empty map.
pub fn pick_worst(evaluations: &VariantMap<Evaluation>) -> Option<Evaluation> {
    let mut worst: Option<&Evaluation> = None;
    for evaluation in evaluations.values() {
        match worst {
            Some(current)
                if evaluation.rating().override_strength()
                    <= current.rating().override_strength() => {}
            _ => worst = Some(evaluation),
        }
    }
    worst.cloned()
}

/// Merges per-variant trees and detects where variants disagree.
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Merge per-variant trees into one aggregate tree.
    ///
    /// Every tree must contain every attribute of the registry, and there
    /// must be at least one tree.
    pub fn aggregate(
        &self,
        registry: &AttributeRegistry,
        per_variant: &VariantMap<EvaluationTree>,
    ) -> Result<EvaluationTree, RatingError> {
        let mut tree = EvaluationTree::default();
        for group in registry.groups() {
            let mut evaluated = EvaluatedGroup::default();

            for attribute in &group.attributes {
                let mut evaluations = VariantMap::new();
                for (variant, variant_tree) in per_variant {
                    let evaluation = variant_tree.get(attribute.id).ok_or(
                        RatingError::MissingEvaluation {
                            variant: *variant,
                            attribute: attribute.id,
                        },
                    )?;
                    evaluations.insert(*variant, evaluation.clone());
                }

                let merged = (attribute.aggregate)(&evaluations).ok_or(
                    RatingError::NothingToMerge {
                        attribute: attribute.id,
                    },
                )?;

                if evaluations.values().any(|e| e.value.id != merged.value.id) {
                    tracing::debug!(
                        attribute = attribute.id,
                        merged = merged.value.id,
                        rating = %merged.rating(),
                        "Variants disagree, merged to worst"
                    );
                }

                evaluated.attributes.insert(attribute.id, merged);
            }

            tree.groups.insert(group.id, evaluated);
        }

        Ok(tree)
    }

    /// Attributes whose outcome at each variant is not shared by the others.
    ///
    /// A variant is flagged for an attribute when it has a real outcome and
    /// at least one other variant has a different, non-`UNRATED` outcome.
    /// An `UNRATED` variant abstains: it is never flagged and never causes
    /// another variant to be flagged. With a single variant nothing is
    /// flagged. Every variant of `per_variant` gets an entry.
    pub fn divergences(
        &self,
        registry: &AttributeRegistry,
        per_variant: &VariantMap<EvaluationTree>,
    ) -> VariantMap<BTreeSet<&'static str>> {
        let mut divergent: VariantMap<BTreeSet<&'static str>> = per_variant
            .keys()
            .map(|variant| (*variant, BTreeSet::new()))
            .collect();

        if per_variant.len() < 2 {
            return divergent;
        }

        for attribute in registry.attributes() {
            for (variant, tree) in per_variant {
                let Some(own) = tree.get(attribute.id) else {
                    continue;
                };
                if own.rating() == Rating::Unrated {
                    continue;
                }

                let disagrees = per_variant
                    .iter()
                    .filter(|(other, _)| *other != variant)
                    .filter_map(|(_, other_tree)| other_tree.get(attribute.id))
                    .any(|other| {
                        other.rating() != Rating::Unrated && other.value.id != own.value.id
                    });

                if disagrees {
                    if let Some(set) = divergent.get_mut(variant) {
                        set.insert(attribute.id);
                    }
                }
            }
        }

        divergent
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
