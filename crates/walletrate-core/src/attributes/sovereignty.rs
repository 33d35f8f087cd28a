//! Self-sovereignty attributes.
//!
//! **Question**: Can the user reach the chain without depending on
//! infrastructure the wallet's developers choose?

use crate::declaration::RpcEndpointConfiguration;
use crate::types::{Evaluation, Rating, WalletMetadata};
use crate::RatingError;

use super::{Attribute, AttributeGroup, EvaluationContext, Outcome};

pub(crate) fn group() -> AttributeGroup {
    AttributeGroup::new(
        "self_sovereignty",
        "Self-sovereignty",
        [(self_hosted_node(), 2.0), (chain_configurability(), 1.0)],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfHostedNodeOutcome {
    DuringOnboarding,
    AfterOnboarding,
    NotSupported,
}

impl Outcome for SelfHostedNodeOutcome {
    const ALL: &'static [Self] = &[
        SelfHostedNodeOutcome::DuringOnboarding,
        SelfHostedNodeOutcome::AfterOnboarding,
        SelfHostedNodeOutcome::NotSupported,
    ];

    fn id(self) -> &'static str {
        match self {
            SelfHostedNodeOutcome::DuringOnboarding => "during_onboarding",
            SelfHostedNodeOutcome::AfterOnboarding => "after_onboarding",
            SelfHostedNodeOutcome::NotSupported => "not_supported",
        }
    }

    fn rating(self) -> Rating {
        match self {
            SelfHostedNodeOutcome::DuringOnboarding => Rating::Pass,
            SelfHostedNodeOutcome::AfterOnboarding => Rating::Partial,
            SelfHostedNodeOutcome::NotSupported => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            SelfHostedNodeOutcome::DuringOnboarding => "Self-hosted node from the start",
            SelfHostedNodeOutcome::AfterOnboarding => "Self-hosted node after setup",
            SelfHostedNodeOutcome::NotSupported => "No self-hosted node",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            SelfHostedNodeOutcome::DuringOnboarding => {
                format!("{name} lets you use your own node before any request is made.")
            }
            SelfHostedNodeOutcome::AfterOnboarding => format!(
                "{name} lets you use your own node, but only after contacting its default \
                 provider."
            ),
            SelfHostedNodeOutcome::NotSupported => {
                format!("{name} only talks to the chain through its own providers.")
            }
        }
    }
}

fn evaluate_self_hosted_node(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(chains) = ctx.features.chain_configurability else {
        return Ok(ctx.unrated("chain_configurability"));
    };

    let evaluation = match chains.l1_rpc_endpoint {
        RpcEndpointConfiguration::DuringOnboarding => ctx.evaluation(
            SelfHostedNodeOutcome::DuringOnboarding,
            "The L1 RPC endpoint can be set during onboarding.",
        ),
        RpcEndpointConfiguration::AfterOnboarding => ctx
            .evaluation(
                SelfHostedNodeOutcome::AfterOnboarding,
                "The L1 RPC endpoint can only be changed once the wallet is set up.",
            )
            .with_impact("The default provider sees your addresses before you can switch.")
            .with_how_to_improve("Offer RPC configuration as part of onboarding."),
        RpcEndpointConfiguration::Never => ctx
            .evaluation(
                SelfHostedNodeOutcome::NotSupported,
                "The L1 RPC endpoint cannot be changed.",
            )
            .with_impact("The wallet stops working if its provider goes down or censors you.")
            .with_how_to_improve("Let users configure the L1 RPC endpoint."),
    };
    Ok(evaluation)
}

fn self_hosted_node() -> Attribute {
    Attribute::new::<SelfHostedNodeOutcome>(
        "self_hosted_node",
        "Self-hosted node",
        evaluate_self_hosted_node,
    )
    .question("Can the wallet be pointed at your own Ethereum node?")
    .why_it_matters("Your own node verifies the chain for you and learns nothing about you.")
    .methodology(
        "Rated on when the L1 RPC endpoint becomes configurable. Configuring it before the \
         first request passes.",
    )
    .example(
        Rating::Pass,
        "RPC prompt on first launch.",
        SelfHostedNodeOutcome::DuringOnboarding,
    )
    .example(
        Rating::Partial,
        "RPC setting buried in advanced settings.",
        SelfHostedNodeOutcome::AfterOnboarding,
    )
    .example(
        Rating::Fail,
        "Hard-coded provider.",
        SelfHostedNodeOutcome::NotSupported,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainConfigurabilityOutcome {
    CustomChains,
    RpcOnly,
    Fixed,
}

impl Outcome for ChainConfigurabilityOutcome {
    const ALL: &'static [Self] = &[
        ChainConfigurabilityOutcome::CustomChains,
        ChainConfigurabilityOutcome::RpcOnly,
        ChainConfigurabilityOutcome::Fixed,
    ];

    fn id(self) -> &'static str {
        match self {
            ChainConfigurabilityOutcome::CustomChains => "custom_chains",
            ChainConfigurabilityOutcome::RpcOnly => "rpc_only",
            ChainConfigurabilityOutcome::Fixed => "fixed",
        }
    }

    fn rating(self) -> Rating {
        match self {
            ChainConfigurabilityOutcome::CustomChains => Rating::Pass,
            ChainConfigurabilityOutcome::RpcOnly => Rating::Partial,
            ChainConfigurabilityOutcome::Fixed => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            ChainConfigurabilityOutcome::CustomChains => "Custom chains",
            ChainConfigurabilityOutcome::RpcOnly => "Configurable RPC only",
            ChainConfigurabilityOutcome::Fixed => "Fixed chains",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            ChainConfigurabilityOutcome::CustomChains => {
                format!("{name} lets you add chains and configure how it reaches them.")
            }
            ChainConfigurabilityOutcome::RpcOnly => {
                format!("{name} lets you change RPC endpoints but not add chains.")
            }
            ChainConfigurabilityOutcome::Fixed => {
                format!("{name} only supports the chains and endpoints it ships with.")
            }
        }
    }
}

fn evaluate_chain_configurability(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(chains) = ctx.features.chain_configurability else {
        return Ok(ctx.unrated("chain_configurability"));
    };

    if chains.custom_chains {
        return Ok(ctx.evaluation(
            ChainConfigurabilityOutcome::CustomChains,
            "Custom chains with their own RPC endpoints can be added.",
        ));
    }

    let evaluation = match chains.l1_rpc_endpoint {
        RpcEndpointConfiguration::Never => ctx
            .evaluation(
                ChainConfigurabilityOutcome::Fixed,
                "Neither chains nor endpoints can be configured.",
            )
            .with_how_to_improve("Allow adding custom chains and endpoints."),
        RpcEndpointConfiguration::AfterOnboarding
        | RpcEndpointConfiguration::DuringOnboarding => ctx
            .evaluation(
                ChainConfigurabilityOutcome::RpcOnly,
                "Endpoints can be changed, chains cannot be added.",
            )
            .with_how_to_improve("Allow adding custom chains."),
    };
    Ok(evaluation)
}

fn chain_configurability() -> Attribute {
    Attribute::new::<ChainConfigurabilityOutcome>(
        "chain_configurability",
        "Chain configurability",
        evaluate_chain_configurability,
    )
    .question("Can you add chains and choose how the wallet reaches them?")
    .why_it_matters("Fixed chain lists leave users at the mercy of the wallet's defaults.")
    .methodology("Custom chains pass; configurable RPC endpoints alone are partial.")
    .example(
        Rating::Pass,
        "Any EVM chain can be added.",
        ChainConfigurabilityOutcome::CustomChains,
    )
    .example(
        Rating::Partial,
        "Built-in chains with editable RPC URLs.",
        ChainConfigurabilityOutcome::RpcOnly,
    )
    .example(
        Rating::Fail,
        "Built-in chains and endpoints only.",
        ChainConfigurabilityOutcome::Fixed,
    )
}
