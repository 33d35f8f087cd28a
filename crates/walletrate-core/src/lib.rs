//! # walletrate-core
//!
//! Deterministic wallet rating engine.
//!
//! This crate rates wallets against a fixed taxonomy of attributes and
//! answers, for every attribute:
//! - How does each build variant of the wallet rate?
//! - What is the wallet's single canonical rating?
//! - Which variants rate differently from the rest?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same declaration always produces the same rating
//! 2. **Explainable**: Every evaluation names the facts it was based on
//! 3. **Closed**: Every outcome an attribute produces is declared upfront
//! 4. **Parallel-safe**: Wallets, variants and attributes share no state
//!
//! ## Example
//!
//! ```rust,ignore
//! use walletrate_core::{AttributeRegistry, WalletDeclaration, rate_wallet};
//!
//! let registry = AttributeRegistry::standard()?;
//! let declaration = WalletDeclaration::from_file("rabby.yaml")?;
//! let rated = rate_wallet(&registry, &declaration)?;
//!
//! for (group, attribute, evaluation) in rated.overall.iter() {
//!     println!("{group}/{attribute}: {}", evaluation.rating());
//! }
//! ```

pub mod aggregator;
pub mod attributes;
pub mod declaration;
pub mod evaluator;
pub mod feature;
pub mod rated;
pub mod scorer;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{pick_worst, Aggregator};
pub use attributes::{
    Attribute, AttributeGroup, AttributeRegistry, EvaluationContext, Outcome, RegistryError,
};
pub use declaration::{DeclarationError, WalletDeclaration, WalletFeatures};
pub use evaluator::Evaluator;
pub use feature::Feature;
pub use rated::{RatedWallet, VariantSpecificity};
pub use scorer::{GroupScore, OverallScore, Scorer};
pub use types::{
    EvaluatedGroup, Evaluation, EvaluationTree, Rating, Value, ValueData, Variant, VariantMap,
    WalletMetadata, WalletProfile,
};

use rayon::prelude::*;
use thiserror::Error;

/// Contract violations while rating one wallet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    #[error("Wallet {wallet} declares no variants")]
    NoVariants { wallet: String },

    #[error("Wallet {wallet} does not support the {variant} variant")]
    VariantNotSupported { wallet: String, variant: Variant },

    #[error("Wallet {wallet}: feature {feature} declares unsupported variant {variant}")]
    UnsupportedVariant {
        wallet: String,
        feature: &'static str,
        variant: Variant,
    },

    #[error("Attribute {attribute} produced undeclared outcome {outcome}")]
    UndeclaredOutcome {
        attribute: &'static str,
        outcome: &'static str,
    },

    #[error("Wallet {wallet} ({variant}): contradictory facts for {attribute}: {reason}")]
    ContradictoryFacts {
        wallet: String,
        variant: Variant,
        attribute: &'static str,
        reason: String,
    },

    #[error("No {variant} evaluation for attribute {attribute}")]
    MissingEvaluation {
        variant: Variant,
        attribute: &'static str,
    },

    #[error("Nothing to merge for attribute {attribute}")]
    NothingToMerge { attribute: &'static str },

    #[error("Group {group}: attribute {attribute} has no weight")]
    MissingWeight {
        group: &'static str,
        attribute: &'static str,
    },

    #[error("Group {group}: weight given for unknown attribute {attribute}")]
    UnknownAttribute {
        group: &'static str,
        attribute: &'static str,
    },
}

/// Rate a single wallet.
///
/// This is the main entry point for rating.
pub fn rate_wallet(
    registry: &AttributeRegistry,
    declaration: &WalletDeclaration,
) -> Result<RatedWallet, RatingError> {
    RatedWallet::rate(registry, declaration)
}

/// Rate many wallets in parallel.
///
/// Results are returned in input order, one per declaration, so a
/// malformed wallet never prevents the others from being rated.
pub fn rate_all(
    registry: &AttributeRegistry,
    declarations: &[WalletDeclaration],
) -> Vec<Result<RatedWallet, RatingError>> {
    declarations
        .par_iter()
        .map(|declaration| {
            let result = rate_wallet(registry, declaration);
            if let Err(e) = &result {
                tracing::warn!(wallet = %declaration.metadata.id, error = %e, "Wallet rating failed");
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RABBY: &str = r#"
metadata:
  id: "rabby"
  display_name: "Rabby"
  repository_url: "https://github.com/RabbyHub/Rabby"
profile: generic
variants: [browser, desktop]
features:
  license: mit
  source_visibility: public
  security_audits:
    - auditor: "Least Authority"
      date: 2023-04-01
  fee_display: itemized
"#;

    const BROKEN: &str = r#"
metadata:
  id: "broken"
  display_name: "Broken"
profile: generic
variants: [browser]
features:
  license: mit
  source_visibility: private
"#;

    #[test]
    fn test_rate_wallet() {
        let registry = AttributeRegistry::standard().unwrap();
        let declaration = WalletDeclaration::from_yaml(RABBY).unwrap();
        let rated = rate_wallet(&registry, &declaration).unwrap();

        assert_eq!(rated.overall.get("open_source").unwrap().rating(), Rating::Pass);
        assert_eq!(rated.overall.get("security_audits").unwrap().value.id, "audited");
        assert!(rated.divergences.values().all(|set| set.is_empty()));
    }

    #[test]
    fn test_rate_all_isolates_failures() {
        let registry = AttributeRegistry::standard().unwrap();
        let declarations = vec![
            WalletDeclaration::from_yaml(RABBY).unwrap(),
            WalletDeclaration::from_yaml(BROKEN).unwrap(),
            WalletDeclaration::from_yaml(RABBY).unwrap(),
        ];

        let results = rate_all(&registry, &declarations);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(RatingError::ContradictoryFacts {
                attribute: "open_source",
                ..
            })
        ));
        assert_eq!(results[0], results[2]);
    }
}
