//! Rated wallets: per-variant trees, their aggregate and the divergence map.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::aggregator::Aggregator;
use crate::attributes::AttributeRegistry;
use crate::declaration::WalletDeclaration;
use crate::evaluator::Evaluator;
use crate::scorer::{OverallScore, Scorer};
use crate::types::{Evaluation, EvaluationTree, Variant, VariantMap, WalletMetadata, WalletProfile};
use crate::RatingError;

/// How a variant's evaluation relates to the wallet's other variants.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VariantSpecificity {
    /// The wallet has a single variant
    OnlyVariant,
    /// Every rated variant agrees
    AllSame,
    /// This variant's outcome differs from another variant's
    UniqueToVariant,
}

/// The full rating of one wallet. Built once, never mutated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatedWallet {
    pub metadata: WalletMetadata,
    pub profile: WalletProfile,

    /// One tree per supported variant
    pub variants: VariantMap<EvaluationTree>,

    /// Merge of every variant tree
    pub overall: EvaluationTree,

    /// Attribute ids whose evaluation is unique to each variant
    pub divergences: VariantMap<BTreeSet<&'static str>>,
}

impl RatedWallet {
    /// Rate a wallet declaration against the registry.
    pub fn rate(
        registry: &AttributeRegistry,
        declaration: &WalletDeclaration,
    ) -> Result<Self, RatingError> {
        if declaration.variants.is_empty() {
            return Err(RatingError::NoVariants {
                wallet: declaration.metadata.id.clone(),
            });
        }

        let evaluator = Evaluator::new(registry);
        let mut variants = VariantMap::new();
        for variant in &declaration.variants {
            variants.insert(*variant, evaluator.evaluate_variant(declaration, *variant)?);
        }

        let aggregator = Aggregator::new();
        let overall = aggregator.aggregate(registry, &variants)?;
        let divergences = aggregator.divergences(registry, &variants);

        let divergent = divergences.values().map(|set| set.len()).sum::<usize>();
        tracing::info!(
            wallet = %declaration.metadata.id,
            variants = variants.len(),
            divergent,
            "Wallet rated"
        );

        Ok(Self {
            metadata: declaration.metadata.clone(),
            profile: declaration.profile,
            variants,
            overall,
            divergences,
        })
    }

    /// Evaluation of an attribute at a variant, or in the aggregate when
    /// `variant` is `None`.
    pub fn evaluation(&self, variant: Option<Variant>, attribute_id: &str) -> Option<&Evaluation> {
        match variant {
            Some(variant) => self.variants.get(&variant)?.get(attribute_id),
            None => self.overall.get(attribute_id),
        }
    }

    /// `None` if the variant is unsupported or the attribute unknown.
    pub fn variant_specificity(
        &self,
        variant: Variant,
        attribute_id: &str,
    ) -> Option<VariantSpecificity> {
        self.evaluation(Some(variant), attribute_id)?;

        if self.variants.len() == 1 {
            return Some(VariantSpecificity::OnlyVariant);
        }

        let unique = self
            .divergences
            .get(&variant)
            .is_some_and(|set| set.contains(attribute_id));
        Some(if unique {
            VariantSpecificity::UniqueToVariant
        } else {
            VariantSpecificity::AllSame
        })
    }

    /// Whether any variant diverges on the attribute.
    pub fn has_divergence(&self, attribute_id: &str) -> bool {
        self.divergences
            .values()
            .any(|set| set.contains(attribute_id))
    }

    /// Overall score of the aggregate tree.
    pub fn score(&self, registry: &AttributeRegistry) -> Result<Option<OverallScore>, RatingError> {
        Scorer::new(registry).overall(&self.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    const MULTI_VARIANT: &str = r#"
metadata:
  id: "flux"
  display_name: "Flux"
profile: generic
variants: [mobile, desktop, browser]
features:
  fee_display:
    mobile: itemized
    desktop: none
  multi_address: batched
"#;

    fn rated(yaml: &str) -> RatedWallet {
        let registry = AttributeRegistry::standard().unwrap();
        let declaration = WalletDeclaration::from_yaml(yaml).unwrap();
        RatedWallet::rate(&registry, &declaration).unwrap()
    }

    #[test]
    fn test_rate_builds_tree_per_variant() {
        let wallet = rated(MULTI_VARIANT);
        assert_eq!(wallet.variants.len(), 3);
        assert_eq!(wallet.divergences.len(), 3);
    }

    #[test]
    fn test_aggregate_takes_worst_variant() {
        let wallet = rated(MULTI_VARIANT);
        let merged = wallet.evaluation(None, "fee_transparency").unwrap();
        assert_eq!(merged.value.id, "hidden");
        assert_eq!(
            wallet
                .evaluation(Some(Variant::Mobile), "fee_transparency")
                .unwrap()
                .value
                .id,
            "itemized"
        );
    }

    #[test]
    fn test_divergence_ignores_unrated_variant() {
        let wallet = rated(MULTI_VARIANT);
        assert_eq!(
            wallet.variant_specificity(Variant::Mobile, "fee_transparency"),
            Some(VariantSpecificity::UniqueToVariant)
        );
        assert_eq!(
            wallet.variant_specificity(Variant::Desktop, "fee_transparency"),
            Some(VariantSpecificity::UniqueToVariant)
        );
        assert_eq!(
            wallet.variant_specificity(Variant::Browser, "fee_transparency"),
            Some(VariantSpecificity::AllSame)
        );
        assert_eq!(
            wallet.variant_specificity(Variant::Browser, "multi_address_correlation"),
            Some(VariantSpecificity::AllSame)
        );
        assert!(wallet.has_divergence("fee_transparency"));
        assert!(!wallet.has_divergence("multi_address_correlation"));
    }

    #[test]
    fn test_single_variant_is_only_variant() {
        let wallet = rated(
            r#"
metadata:
  id: "solo"
  display_name: "Solo"
profile: generic
variants: [desktop]
features:
  license: mit
"#,
        );
        assert_eq!(
            wallet.variant_specificity(Variant::Desktop, "open_source"),
            Some(VariantSpecificity::OnlyVariant)
        );
        assert_eq!(wallet.variant_specificity(Variant::Mobile, "open_source"), None);
        assert_eq!(wallet.overall, wallet.variants[&Variant::Desktop]);
    }

    #[test]
    fn test_empty_wallet_is_fully_unrated() {
        let wallet = rated(
            r#"
metadata:
  id: "blank"
  display_name: "Blank"
profile: generic
variants: [mobile]
"#,
        );
        let counts = wallet.overall.rating_counts();
        assert_eq!(counts.len(), 1);
        assert!(counts.contains_key(&Rating::Unrated));

        let registry = AttributeRegistry::standard().unwrap();
        let score = wallet.score(&registry).unwrap().unwrap();
        assert_eq!(score.score, 0.0);
        assert!(score.has_unrated);
    }

    #[test]
    fn test_no_variants_rejected() {
        let registry = AttributeRegistry::standard().unwrap();
        let mut declaration = WalletDeclaration::from_yaml(MULTI_VARIANT).unwrap();
        declaration.variants.clear();
        assert!(matches!(
            RatedWallet::rate(&registry, &declaration),
            Err(RatingError::NoVariants { .. })
        ));
    }
}
