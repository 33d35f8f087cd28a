//! Evaluator: builds one evaluation tree per wallet variant.

use crate::attributes::{AttributeRegistry, EvaluationContext};
use crate::declaration::WalletDeclaration;
use crate::types::{EvaluatedGroup, EvaluationTree, Variant};
use crate::RatingError;

/// Runs every attribute of a registry against one variant's facts.
pub struct Evaluator<'r> {
    registry: &'r AttributeRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r AttributeRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate every attribute for one supported variant.
    ///
    /// Fails on the first contract violation: an unsupported variant, an
    /// unsupported per-variant key, or an attribute that errors.
    pub fn evaluate_variant(
        &self,
        declaration: &WalletDeclaration,
        variant: Variant,
    ) -> Result<EvaluationTree, RatingError> {
        let wallet = &declaration.metadata;

        if !declaration.variants.contains(&variant) {
            return Err(RatingError::VariantNotSupported {
                wallet: wallet.id.clone(),
                variant,
            });
        }
        if let Some((feature, variant)) = declaration.unsupported_variant_key() {
            return Err(RatingError::UnsupportedVariant {
                wallet: wallet.id.clone(),
                feature,
                variant,
            });
        }

        let ctx = EvaluationContext {
            wallet,
            profile: declaration.profile,
            variant,
            features: declaration.features.resolve(variant),
        };

        let mut tree = EvaluationTree::default();
        for group in self.registry.groups() {
            let mut evaluated = EvaluatedGroup::default();
            for attribute in &group.attributes {
                let evaluation = attribute.evaluate_checked(&ctx)?;
                tracing::trace!(
                    wallet = %wallet.id,
                    variant = %variant,
                    attribute = attribute.id,
                    outcome = evaluation.value.id,
                    "Attribute evaluated"
                );
                evaluated.attributes.insert(attribute.id, evaluation);
            }
            tree.groups.insert(group.id, evaluated);
        }

        Ok(tree)
    }
}
