//! Core vocabulary shared by every stage of a rating.
//!
//! The closed sets (ratings, variants, profiles) and the outcome records
//! produced by attribute evaluation live here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::declaration::SecurityAudit;

/// Outcome class of a single attribute evaluation.
///
/// `Unrated` and `Exempt` are informational placeholders. They are not
/// points on the pass/partial/fail severity scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    Pass,
    Partial,
    Fail,
    Unrated,
    Exempt,
}

impl Rating {
    /// Every rating class, in display order.
    pub const ALL: [Rating; 5] = [
        Rating::Pass,
        Rating::Partial,
        Rating::Fail,
        Rating::Unrated,
        Rating::Exempt,
    ];

    /// Score a value of this rating contributes when it carries no override.
    ///
    /// `Exempt` has no score: exempt attributes are removed from scoring.
    pub fn default_score(self) -> Option<f64> {
        match self {
            Rating::Pass => Some(1.0),
            Rating::Partial => Some(0.5),
            Rating::Fail => Some(0.0),
            Rating::Unrated => Some(0.0),
            Rating::Exempt => None,
        }
    }

    /// Whether this rating is an actual judgment of the wallet.
    pub fn is_judgment(self) -> bool {
        matches!(self, Rating::Pass | Rating::Partial | Rating::Fail)
    }

    /// How hard a rating is to override when merging variants.
    ///
    /// Higher wins: `Fail` > `Partial` > `Pass` > `Unrated` > `Exempt`.
    pub(crate) fn override_strength(self) -> u8 {
        match self {
            Rating::Exempt => 0,
            Rating::Unrated => 1,
            Rating::Pass => 2,
            Rating::Partial => 3,
            Rating::Fail => 4,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Pass => "PASS",
            Rating::Partial => "PARTIAL",
            Rating::Fail => "FAIL",
            Rating::Unrated => "UNRATED",
            Rating::Exempt => "EXEMPT",
        };
        f.write_str(label)
    }
}

/// A build form factor of a wallet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Mobile,
    Desktop,
    Browser,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Mobile, Variant::Desktop, Variant::Browser];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Mobile => "mobile",
            Variant::Desktop => "desktop",
            Variant::Browser => "browser",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown variant: {0}")]
pub struct ParseVariantError(pub String);

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}

/// Map keyed by variant. Iteration follows the canonical variant order.
pub type VariantMap<T> = BTreeMap<Variant, T>;

/// Classification of a wallet that decides which attributes apply to it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WalletProfile {
    #[default]
    Generic,
    /// Wallets built only for making payments.
    Payments,
}

/// Descriptive data about a wallet, used to parameterise explanations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletMetadata {
    /// Stable identifier (e.g., "rabby")
    pub id: String,

    /// Human-readable name
    pub display_name: String,

    /// Homepage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Source repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

/// Auxiliary data carried by a value beyond its rating.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ValueData {
    /// Audit records backing a security audit rating.
    Audits(Vec<SecurityAudit>),
}

/// A concrete outcome of one attribute.
///
/// `id` is unique within the owning attribute's outcome space only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Value {
    pub id: &'static str,
    pub rating: Rating,

    /// Short label (e.g., "Open source")
    pub display_name: &'static str,

    /// Longer sentence naming the wallet
    pub explanation: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,

    /// Explicit score overriding the rating's default score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ValueData>,
}

impl Value {
    /// The value used when facts are insufficient to rate.
    pub fn unrated(wallet: &WalletMetadata) -> Self {
        Self {
            id: UNRATED_ID,
            rating: Rating::Unrated,
            display_name: "Not yet rated",
            explanation: format!("{} has not been rated on this yet.", wallet.display_name),
            icon: None,
            score: None,
            data: None,
        }
    }

    /// The value used when an attribute does not apply to a wallet.
    pub fn exempt(wallet: &WalletMetadata) -> Self {
        Self {
            id: EXEMPT_ID,
            rating: Rating::Exempt,
            display_name: "Not applicable",
            explanation: format!("This does not apply to {}.", wallet.display_name),
            icon: None,
            score: None,
            data: None,
        }
    }

    /// Score this value contributes, or `None` when it is exempt.
    pub fn effective_score(&self) -> Option<f64> {
        match self.rating {
            Rating::Exempt => None,
            rating => self.score.or_else(|| rating.default_score()),
        }
    }

    /// Attach auxiliary data.
    pub fn with_data(mut self, data: ValueData) -> Self {
        self.data = Some(data);
        self
    }
}

/// Outcome id shared by every attribute for insufficient facts.
pub const UNRATED_ID: &str = "unrated";

/// Outcome id shared by every attribute for inapplicable attributes.
pub const EXEMPT_ID: &str = "exempt";

/// A value plus the explanatory content shown alongside it.
///
/// Produced fresh per (wallet, variant) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Evaluation {
    pub value: Value,

    /// Why this value was chosen, naming the facts used
    pub details: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_improve: Option<String>,
}

impl Evaluation {
    pub fn new(value: Value, details: impl Into<String>) -> Self {
        Self {
            value,
            details: details.into(),
            impact: None,
            how_to_improve: None,
        }
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = Some(impact.into());
        self
    }

    pub fn with_how_to_improve(mut self, how: impl Into<String>) -> Self {
        self.how_to_improve = Some(how.into());
        self
    }

    pub fn rating(&self) -> Rating {
        self.value.rating
    }
}

/// Evaluations of every attribute of one group.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct EvaluatedGroup {
    pub attributes: BTreeMap<&'static str, Evaluation>,
}

impl EvaluatedGroup {
    pub fn get(&self, attribute_id: &str) -> Option<&Evaluation> {
        self.attributes.get(attribute_id)
    }
}

/// Every evaluated attribute of one wallet, for one variant or the aggregate.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct EvaluationTree {
    pub groups: BTreeMap<&'static str, EvaluatedGroup>,
}

impl EvaluationTree {
    /// Look up an attribute by id across all groups.
    pub fn get(&self, attribute_id: &str) -> Option<&Evaluation> {
        self.groups.values().find_map(|g| g.get(attribute_id))
    }

    /// Iterate `(group_id, attribute_id, evaluation)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str, &Evaluation)> {
        self.groups.iter().flat_map(|(group_id, group)| {
            group
                .attributes
                .iter()
                .map(move |(attribute_id, evaluation)| (*group_id, *attribute_id, evaluation))
        })
    }

    /// Count of attributes per rating class.
    pub fn rating_counts(&self) -> BTreeMap<Rating, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, evaluation) in self.iter() {
            *counts.entry(evaluation.rating()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletMetadata {
        WalletMetadata {
            id: "test".to_string(),
            display_name: "Test Wallet".to_string(),
            url: None,
            repository_url: None,
        }
    }

    #[test]
    fn test_variant_round_trips_through_str() {
        for variant in Variant::ALL {
            assert_eq!(variant.as_str().parse::<Variant>().unwrap(), variant);
        }
        assert!("tablet".parse::<Variant>().is_err());
    }

    #[test]
    fn test_default_scores() {
        assert_eq!(Rating::Pass.default_score(), Some(1.0));
        assert_eq!(Rating::Partial.default_score(), Some(0.5));
        assert_eq!(Rating::Fail.default_score(), Some(0.0));
        assert_eq!(Rating::Unrated.default_score(), Some(0.0));
        assert_eq!(Rating::Exempt.default_score(), None);
    }

    #[test]
    fn test_score_override_wins() {
        let mut value = Value::unrated(&wallet());
        value.rating = Rating::Partial;
        value.score = Some(0.25);
        assert_eq!(value.effective_score(), Some(0.25));
    }

    #[test]
    fn test_exempt_value_never_scores() {
        let mut value = Value::exempt(&wallet());
        value.score = Some(1.0);
        assert_eq!(value.effective_score(), None);
        assert!(value.explanation.contains("Test Wallet"));
    }

    #[test]
    fn test_rating_counts() {
        let mut group = EvaluatedGroup::default();
        group
            .attributes
            .insert("a", Evaluation::new(Value::unrated(&wallet()), "no data"));
        group
            .attributes
            .insert("b", Evaluation::new(Value::exempt(&wallet()), "n/a"));
        let mut tree = EvaluationTree::default();
        tree.groups.insert("g", group);

        let counts = tree.rating_counts();
        assert_eq!(counts.get(&Rating::Unrated), Some(&1));
        assert_eq!(counts.get(&Rating::Exempt), Some(&1));
        assert!(tree.get("a").is_some());
        assert!(tree.get("missing").is_none());
    }
}
