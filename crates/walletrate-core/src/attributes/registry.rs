//! Attribute groups and the registry that holds them.
//!
//! The registry is built once, self-checked, and then passed by reference
//! to everything that evaluates or scores. It never changes afterwards.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::{standard_groups, Attribute};
use crate::scorer::{weighted_score, GroupScore};
use crate::types::{EvaluatedGroup, Rating};
use crate::RatingError;

lazy_static! {
    /// Group, attribute and outcome identifiers.
    static ref ID_PATTERN: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

/// Errors from the registry self-check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Duplicate group id: {0}")]
    DuplicateGroup(&'static str),

    #[error("Duplicate attribute id: {0}")]
    DuplicateAttribute(&'static str),

    #[error("Duplicate outcome id {outcome} in attribute {attribute}")]
    DuplicateOutcome {
        attribute: &'static str,
        outcome: &'static str,
    },

    #[error("Group {group}: weights do not match attributes ({reason})")]
    WeightMismatch { group: &'static str, reason: String },

    #[error("Group {group}: weight for {attribute} must be positive and finite")]
    InvalidWeight {
        group: &'static str,
        attribute: &'static str,
    },

    #[error("Attribute {0} has no outcome with the maximal score")]
    NoMaximalOutcome(&'static str),

    #[error("Attribute {attribute}: example references undeclared outcome {outcome}")]
    UnknownExampleOutcome {
        attribute: &'static str,
        outcome: &'static str,
    },

    #[error("Attribute {attribute}: example for {outcome} listed under {listed} but rates {actual}")]
    ExampleRatingMismatch {
        attribute: &'static str,
        outcome: &'static str,
        listed: Rating,
        actual: Rating,
    },

    #[error("Attribute {attribute}: outcome {outcome} has no canonical example")]
    MissingExample {
        attribute: &'static str,
        outcome: &'static str,
    },
}

/// A named, closed bundle of attributes with scoring weights.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeGroup {
    pub id: &'static str,
    pub display_name: &'static str,
    pub attributes: Vec<Attribute>,
    pub weights: BTreeMap<&'static str, f64>,
}

impl AttributeGroup {
    /// Build a group from `(attribute, weight)` pairs.
    pub fn new(
        id: &'static str,
        display_name: &'static str,
        members: impl IntoIterator<Item = (Attribute, f64)>,
    ) -> Self {
        let mut attributes = Vec::new();
        let mut weights = BTreeMap::new();
        for (attribute, weight) in members {
            weights.insert(attribute.id, weight);
            attributes.push(attribute);
        }
        Self {
            id,
            display_name,
            attributes,
            weights,
        }
    }

    pub fn attribute(&self, id: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Weighted score of this group's evaluations.
    pub fn score(&self, evaluated: &EvaluatedGroup) -> Result<GroupScore, RatingError> {
        weighted_score(self.id, evaluated, &self.weights)
    }

    fn check(&self) -> Result<(), RegistryError> {
        let attribute_ids: HashSet<&str> = self.attributes.iter().map(|a| a.id).collect();
        let weight_ids: HashSet<&str> = self.weights.keys().copied().collect();

        if attribute_ids.len() != self.attributes.len() || attribute_ids != weight_ids {
            let mut missing: Vec<&str> = attribute_ids.difference(&weight_ids).copied().collect();
            let mut extra: Vec<&str> = weight_ids.difference(&attribute_ids).copied().collect();
            missing.sort_unstable();
            extra.sort_unstable();
            return Err(RegistryError::WeightMismatch {
                group: self.id,
                reason: format!(
                    "unweighted: [{}], unknown: [{}]",
                    missing.join(", "),
                    extra.join(", ")
                ),
            });
        }

        for (attribute, weight) in &self.weights {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(RegistryError::InvalidWeight {
                    group: self.id,
                    attribute: *attribute,
                });
            }
        }

        Ok(())
    }
}

/// Check invariants every attribute must uphold.
fn check_attribute(attribute: &Attribute) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for outcome in &attribute.outcomes {
        if !ID_PATTERN.is_match(outcome.id) {
            return Err(RegistryError::InvalidId(format!(
                "{}.{}",
                attribute.id, outcome.id
            )));
        }
        if !seen.insert(outcome.id) {
            return Err(RegistryError::DuplicateOutcome {
                attribute: attribute.id,
                outcome: outcome.id,
            });
        }
    }

    let has_maximal = attribute
        .outcomes
        .iter()
        .filter_map(|o| o.effective_score())
        .any(|score| score >= 1.0);
    if !has_maximal {
        return Err(RegistryError::NoMaximalOutcome(attribute.id));
    }

    for example in &attribute.examples {
        let declared =
            attribute
                .outcome(example.outcome)
                .ok_or(RegistryError::UnknownExampleOutcome {
                    attribute: attribute.id,
                    outcome: example.outcome,
                })?;
        if declared.rating != example.rating {
            return Err(RegistryError::ExampleRatingMismatch {
                attribute: attribute.id,
                outcome: example.outcome,
                listed: example.rating,
                actual: declared.rating,
            });
        }
    }

    for outcome in attribute.outcomes.iter().filter(|o| o.rating.is_judgment()) {
        if !attribute.examples.iter().any(|e| e.outcome == outcome.id) {
            return Err(RegistryError::MissingExample {
                attribute: attribute.id,
                outcome: outcome.id,
            });
        }
    }

    Ok(())
}

/// Immutable registry of every attribute group.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRegistry {
    groups: Vec<AttributeGroup>,
}

impl AttributeRegistry {
    /// Build and self-check a registry.
    pub fn new(groups: Vec<AttributeGroup>) -> Result<Self, RegistryError> {
        let mut group_ids = HashSet::new();
        let mut attribute_ids = HashSet::new();

        for group in &groups {
            if !ID_PATTERN.is_match(group.id) {
                return Err(RegistryError::InvalidId(group.id.to_string()));
            }
            if !group_ids.insert(group.id) {
                return Err(RegistryError::DuplicateGroup(group.id));
            }
            group.check()?;

            for attribute in &group.attributes {
                if !ID_PATTERN.is_match(attribute.id) {
                    return Err(RegistryError::InvalidId(attribute.id.to_string()));
                }
                if !attribute_ids.insert(attribute.id) {
                    return Err(RegistryError::DuplicateAttribute(attribute.id));
                }
                check_attribute(attribute)?;
            }
        }

        tracing::debug!(
            groups = groups.len(),
            attributes = attribute_ids.len(),
            "Attribute registry built"
        );

        Ok(Self { groups })
    }

    /// The standard wallet taxonomy.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(standard_groups())
    }

    pub fn groups(&self) -> &[AttributeGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Find an attribute and the id of its group.
    pub fn attribute(&self, id: &str) -> Option<(&'static str, &Attribute)> {
        self.groups
            .iter()
            .find_map(|g| g.attribute(id).map(|a| (g.id, a)))
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.groups.iter().flat_map(|g| g.attributes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{EvaluationContext, Outcome};
    use crate::types::{Evaluation, WalletMetadata};

    #[derive(Debug, Clone, Copy)]
    enum Toggle {
        On,
        Off,
    }

    impl Outcome for Toggle {
        const ALL: &'static [Self] = &[Toggle::On, Toggle::Off];

        fn id(self) -> &'static str {
            match self {
                Toggle::On => "on",
                Toggle::Off => "off",
            }
        }

        fn rating(self) -> Rating {
            match self {
                Toggle::On => Rating::Pass,
                Toggle::Off => Rating::Fail,
            }
        }

        fn display_name(self) -> &'static str {
            "toggle"
        }

        fn explanation(self, wallet: &WalletMetadata) -> String {
            wallet.display_name.clone()
        }
    }

    fn evaluate(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
        Ok(ctx.evaluation(Toggle::On, "on"))
    }

    fn toggle(id: &'static str) -> Attribute {
        Attribute::new::<Toggle>(id, "Toggle", evaluate)
            .example(Rating::Pass, "on", Toggle::On)
            .example(Rating::Fail, "off", Toggle::Off)
    }

    #[test]
    fn test_standard_registry_passes_self_check() {
        let registry = AttributeRegistry::standard().unwrap();
        assert_eq!(registry.groups().len(), 5);
        assert!(registry.attribute("security_audits").is_some());
        assert_eq!(registry.attribute("open_source").map(|(g, _)| g), Some("transparency"));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let groups = vec![
            AttributeGroup::new("one", "One", [(toggle("toggle"), 1.0)]),
            AttributeGroup::new("two", "Two", [(toggle("toggle"), 1.0)]),
        ];
        assert_eq!(
            AttributeRegistry::new(groups).unwrap_err(),
            RegistryError::DuplicateAttribute("toggle")
        );
    }

    #[test]
    fn test_weight_mismatch_rejected() {
        let mut group = AttributeGroup::new("one", "One", [(toggle("toggle"), 1.0)]);
        group.weights.insert("ghost", 1.0);
        assert!(matches!(
            AttributeRegistry::new(vec![group]),
            Err(RegistryError::WeightMismatch { group: "one", .. })
        ));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let group = AttributeGroup::new("one", "One", [(toggle("toggle"), 0.0)]);
        assert!(matches!(
            AttributeRegistry::new(vec![group]),
            Err(RegistryError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let group = AttributeGroup::new("One Group", "One", [(toggle("toggle"), 1.0)]);
        assert!(matches!(
            AttributeRegistry::new(vec![group]),
            Err(RegistryError::InvalidId(_))
        ));
    }

    #[test]
    fn test_example_under_wrong_rating_rejected() {
        let attribute = Attribute::new::<Toggle>("toggle", "Toggle", evaluate)
            .example(Rating::Pass, "on", Toggle::On)
            .example(Rating::Partial, "off", Toggle::Off);
        let group = AttributeGroup::new("one", "One", [(attribute, 1.0)]);
        assert!(matches!(
            AttributeRegistry::new(vec![group]),
            Err(RegistryError::ExampleRatingMismatch { outcome: "off", .. })
        ));
    }

    #[test]
    fn test_missing_example_rejected() {
        let attribute = Attribute::new::<Toggle>("toggle", "Toggle", evaluate)
            .example(Rating::Pass, "on", Toggle::On);
        let group = AttributeGroup::new("one", "One", [(attribute, 1.0)]);
        assert!(matches!(
            AttributeRegistry::new(vec![group]),
            Err(RegistryError::MissingExample { outcome: "off", .. })
        ));
    }
}
