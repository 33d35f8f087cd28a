//! Scorer: weighted numeric scores for evaluated groups.
//!
//! A group score is `Σ(score × weight) / Σ(weight)` over its attributes,
//! skipping `EXEMPT` ones entirely. A group where everything is exempt
//! scores 0 and is marked `fully_exempt` so callers can hide it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::attributes::AttributeRegistry;
use crate::types::{EvaluatedGroup, EvaluationTree, Rating};
use crate::RatingError;

/// Score of one evaluated group.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GroupScore {
    /// In `[0, 1]`
    pub score: f64,

    /// Some included attribute is `UNRATED`
    pub has_unrated: bool,

    /// Sum of weights of non-exempt attributes
    pub weight_sum: f64,

    pub fully_exempt: bool,
}

/// Weighted score of `evaluated` against a group's weights.
///
/// The weight keys must be exactly the evaluated attribute ids.
pub fn weighted_score(
    group_id: &'static str,
    evaluated: &EvaluatedGroup,
    weights: &BTreeMap<&'static str, f64>,
) -> Result<GroupScore, RatingError> {
    if let Some(&attribute) = evaluated.attributes.keys().find(|a| !weights.contains_key(*a)) {
        return Err(RatingError::MissingWeight {
            group: group_id,
            attribute,
        });
    }
    if let Some(&attribute) = weights.keys().find(|a| !evaluated.attributes.contains_key(*a)) {
        return Err(RatingError::UnknownAttribute {
            group: group_id,
            attribute,
        });
    }

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    let mut has_unrated = false;

    for (attribute, evaluation) in &evaluated.attributes {
        let Some(score) = evaluation.value.effective_score() else {
            continue;
        };
        let weight = weights[attribute];
        total += score * weight;
        weight_sum += weight;
        has_unrated |= evaluation.rating() == Rating::Unrated;
    }

    if weight_sum == 0.0 {
        return Ok(GroupScore {
            score: 0.0,
            has_unrated: false,
            weight_sum: 0.0,
            fully_exempt: true,
        });
    }

    Ok(GroupScore {
        score: total / weight_sum,
        has_unrated,
        weight_sum,
        fully_exempt: false,
    })
}

/// Mean score across the groups of one tree.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverallScore {
    pub score: f64,
    pub has_unrated: bool,
    pub groups: BTreeMap<&'static str, GroupScore>,
}

/// Scores evaluation trees against the registry's weights.
pub struct Scorer<'r> {
    registry: &'r AttributeRegistry,
}

impl<'r> Scorer<'r> {
    pub fn new(registry: &'r AttributeRegistry) -> Self {
        Self { registry }
    }

    /// Score every group of the tree.
    ///
    /// Groups the tree does not contain are skipped.
    pub fn score_tree(
        &self,
        tree: &EvaluationTree,
    ) -> Result<BTreeMap<&'static str, GroupScore>, RatingError> {
        let mut scores = BTreeMap::new();
        for group in self.registry.groups() {
            if let Some(evaluated) = tree.groups.get(group.id) {
                scores.insert(group.id, group.score(evaluated)?);
            }
        }
        Ok(scores)
    }

    /// Unweighted mean of the groups that are not fully exempt.
    ///
    /// `None` when no group contributes.
    pub fn overall(&self, tree: &EvaluationTree) -> Result<Option<OverallScore>, RatingError> {
        let groups = self.score_tree(tree)?;
        let contributing: Vec<&GroupScore> = groups.values().filter(|g| !g.fully_exempt).collect();

        if contributing.is_empty() {
            return Ok(None);
        }

        let score = contributing.iter().map(|g| g.score).sum::<f64>() / contributing.len() as f64;
        let has_unrated = contributing.iter().any(|g| g.has_unrated);

        Ok(Some(OverallScore {
            score,
            has_unrated,
            groups,
        }))
    }
}
