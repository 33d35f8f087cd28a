//! Attributes: the criteria wallets are rated against.
//!
//! Each attribute owns a typed outcome enum, a pure `evaluate` function
//! over the facts of one variant, and an `aggregate` function that merges
//! per-variant evaluations. Attributes are plain data: behaviour is held as
//! function values so a criterion can swap in its own merge strategy
//! without any subclassing.
//!
//! | Group | Attributes |
//! |-------|------------|
//! | security | security_audits, hardware_wallet_support, hardware_wallet_clear_signing, bug_bounty_program, scam_prevention |
//! | privacy | address_correlation, multi_address_correlation |
//! | self_sovereignty | self_hosted_node, chain_configurability |
//! | transparency | open_source, source_visibility, funding, fee_transparency |
//! | ecosystem | browser_integration, address_resolution, account_abstraction |

mod ecosystem;
mod privacy;
mod registry;
mod security;
mod sovereignty;
mod transparency;

pub use registry::{AttributeGroup, AttributeRegistry, RegistryError};

use std::fmt;

use serde::Serialize;

use crate::aggregator::pick_worst;
use crate::declaration::ResolvedFeatures;
use crate::types::{
    Evaluation, Rating, Value, Variant, VariantMap, WalletMetadata, WalletProfile, EXEMPT_ID,
    UNRATED_ID,
};
use crate::RatingError;

/// A closed set of outcomes for one attribute.
///
/// Implemented by one enum per attribute; `ALL` lists every variant so the
/// outcome space can be derived and checked at startup.
pub trait Outcome: Copy + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn id(self) -> &'static str;
    fn rating(self) -> Rating;
    fn display_name(self) -> &'static str;
    fn explanation(self, wallet: &WalletMetadata) -> String;

    fn icon(self) -> Option<&'static str> {
        None
    }

    /// Explicit score overriding the rating's default.
    fn score(self) -> Option<f64> {
        None
    }

    fn value(self, wallet: &WalletMetadata) -> Value {
        Value {
            id: self.id(),
            rating: self.rating(),
            display_name: self.display_name(),
            explanation: self.explanation(wallet),
            icon: self.icon(),
            score: self.score(),
            data: None,
        }
    }
}

/// Facts and metadata visible to an evaluator for one variant.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub wallet: &'a WalletMetadata,
    pub profile: WalletProfile,
    pub variant: Variant,
    pub features: ResolvedFeatures<'a>,
}

impl<'a> EvaluationContext<'a> {
    /// Build an evaluation for a typed outcome.
    pub fn evaluation<O: Outcome>(&self, outcome: O, details: impl Into<String>) -> Evaluation {
        Evaluation::new(outcome.value(self.wallet), details)
    }

    /// The evaluation used when a required fact is undetermined.
    pub fn unrated(&self, missing: &str) -> Evaluation {
        Evaluation::new(
            Value::unrated(self.wallet),
            format!(
                "{} has not declared its {} for the {} variant.",
                self.wallet.display_name,
                missing.replace('_', " "),
                self.variant
            ),
        )
    }

    pub fn exempt(&self, reason: &str) -> Evaluation {
        Evaluation::new(Value::exempt(self.wallet), reason.to_string())
    }

    /// Error for a fact combination no outcome covers.
    pub fn contradiction(&self, attribute: &'static str, reason: impl Into<String>) -> RatingError {
        RatingError::ContradictoryFacts {
            wallet: self.wallet.id.clone(),
            variant: self.variant,
            attribute,
            reason: reason.into(),
        }
    }
}

pub type EvaluateFn = fn(&EvaluationContext<'_>) -> Result<Evaluation, RatingError>;

/// Merge per-variant evaluations. Returns `None` only for an empty map.
pub type AggregateFn = fn(&VariantMap<Evaluation>) -> Option<Evaluation>;

/// One member of an attribute's outcome space.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DeclaredOutcome {
    pub id: &'static str,
    pub rating: Rating,
    pub display_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl DeclaredOutcome {
    fn of<O: Outcome>(outcome: O) -> Self {
        Self {
            id: outcome.id(),
            rating: outcome.rating(),
            display_name: outcome.display_name(),
            score: outcome.score(),
        }
    }

    pub fn effective_score(&self) -> Option<f64> {
        match self.rating {
            Rating::Exempt => None,
            rating => self.score.or_else(|| rating.default_score()),
        }
    }
}

/// A canonical example of an outcome, listed under a rating class.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Example {
    pub rating: Rating,
    pub description: &'static str,
    pub outcome: &'static str,
}

/// A rated criterion.
#[derive(Clone, Serialize)]
pub struct Attribute {
    pub id: &'static str,
    pub display_name: &'static str,
    pub question: &'static str,
    pub why_it_matters: &'static str,
    pub methodology: &'static str,

    /// Every outcome `evaluate` may produce, including unrated/exempt
    pub outcomes: Vec<DeclaredOutcome>,
    pub examples: Vec<Example>,

    /// Profiles this attribute does not apply to
    pub exempt_for: Vec<WalletProfile>,

    #[serde(skip)]
    pub evaluate: EvaluateFn,
    #[serde(skip)]
    pub aggregate: AggregateFn,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("id", &self.id)
            .field("outcomes", &self.outcomes.len())
            .field("exempt_for", &self.exempt_for)
            .finish()
    }
}

impl Attribute {
    /// Start an attribute whose outcome space is `O::ALL` plus unrated.
    pub fn new<O: Outcome>(id: &'static str, display_name: &'static str, evaluate: EvaluateFn) -> Self {
        let mut outcomes: Vec<DeclaredOutcome> =
            O::ALL.iter().map(|o| DeclaredOutcome::of(*o)).collect();
        outcomes.push(DeclaredOutcome {
            id: UNRATED_ID,
            rating: Rating::Unrated,
            display_name: "Not yet rated",
            score: None,
        });

        Self {
            id,
            display_name,
            question: "",
            why_it_matters: "",
            methodology: "",
            outcomes,
            examples: Vec::new(),
            exempt_for: Vec::new(),
            evaluate,
            aggregate: pick_worst,
        }
    }

    pub fn question(mut self, question: &'static str) -> Self {
        self.question = question;
        self
    }

    pub fn why_it_matters(mut self, why: &'static str) -> Self {
        self.why_it_matters = why;
        self
    }

    pub fn methodology(mut self, methodology: &'static str) -> Self {
        self.methodology = methodology;
        self
    }

    /// Add a canonical example listed under `rating`.
    pub fn example<O: Outcome>(mut self, rating: Rating, description: &'static str, outcome: O) -> Self {
        self.examples.push(Example {
            rating,
            description,
            outcome: outcome.id(),
        });
        self
    }

    /// Mark the attribute inapplicable to a profile.
    pub fn exempt_for(mut self, profile: WalletProfile) -> Self {
        if !self.exempt_for.contains(&profile) {
            self.exempt_for.push(profile);
            if !self.declares(EXEMPT_ID) {
                self.outcomes.push(DeclaredOutcome {
                    id: EXEMPT_ID,
                    rating: Rating::Exempt,
                    display_name: "Not applicable",
                    score: None,
                });
            }
        }
        self
    }

    /// Replace the default worst-of merge.
    pub fn aggregate_with(mut self, aggregate: AggregateFn) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn is_exempt(&self, profile: WalletProfile) -> bool {
        self.exempt_for.contains(&profile)
    }

    pub fn declares(&self, outcome_id: &str) -> bool {
        self.outcomes.iter().any(|o| o.id == outcome_id)
    }

    pub fn outcome(&self, outcome_id: &str) -> Option<&DeclaredOutcome> {
        self.outcomes.iter().find(|o| o.id == outcome_id)
    }

    /// Evaluate one variant, deciding exemption before any fact is read.
    pub fn evaluate_checked(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
        let evaluation = if self.is_exempt(ctx.profile) {
            ctx.exempt(&format!(
                "{} does not apply to {:?} wallets.",
                self.display_name, ctx.profile
            ))
        } else {
            (self.evaluate)(ctx)?
        };

        match self.outcome(evaluation.value.id) {
            Some(declared) if declared.rating == evaluation.value.rating => Ok(evaluation),
            _ => Err(RatingError::UndeclaredOutcome {
                attribute: self.id,
                outcome: evaluation.value.id,
            }),
        }
    }
}

/// The standard taxonomy, grouped.
pub(crate) fn standard_groups() -> Vec<AttributeGroup> {
    vec![
        security::group(),
        privacy::group(),
        sovereignty::group(),
        transparency::group(),
        ecosystem::group(),
    ]
}
