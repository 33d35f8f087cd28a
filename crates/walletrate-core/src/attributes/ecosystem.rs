//! Ecosystem attributes.
//!
//! **Question**: Does the wallet keep up with the standards that let it
//! interoperate with the rest of Ethereum?

use crate::types::{Evaluation, Rating, WalletMetadata, WalletProfile};
use crate::RatingError;

use super::{Attribute, AttributeGroup, EvaluationContext, Outcome};

pub(crate) fn group() -> AttributeGroup {
    AttributeGroup::new(
        "ecosystem",
        "Ecosystem",
        [
            (browser_integration(), 1.0),
            (address_resolution(), 1.0),
            (account_abstraction(), 1.0),
        ],
    )
}

// =========================================================================
// BROWSER INTEGRATION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserIntegrationOutcome {
    MultiWalletDiscovery,
    ProviderOnly,
    NotIntegrated,
}

impl Outcome for BrowserIntegrationOutcome {
    const ALL: &'static [Self] = &[
        BrowserIntegrationOutcome::MultiWalletDiscovery,
        BrowserIntegrationOutcome::ProviderOnly,
        BrowserIntegrationOutcome::NotIntegrated,
    ];

    fn id(self) -> &'static str {
        match self {
            BrowserIntegrationOutcome::MultiWalletDiscovery => "multi_wallet_discovery",
            BrowserIntegrationOutcome::ProviderOnly => "provider_only",
            BrowserIntegrationOutcome::NotIntegrated => "not_integrated",
        }
    }

    fn rating(self) -> Rating {
        match self {
            BrowserIntegrationOutcome::MultiWalletDiscovery => Rating::Pass,
            BrowserIntegrationOutcome::ProviderOnly => Rating::Partial,
            BrowserIntegrationOutcome::NotIntegrated => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            BrowserIntegrationOutcome::MultiWalletDiscovery => "Standard browser integration",
            BrowserIntegrationOutcome::ProviderOnly => "Legacy browser integration",
            BrowserIntegrationOutcome::NotIntegrated => "No browser integration",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            BrowserIntegrationOutcome::MultiWalletDiscovery => format!(
                "{name} exposes a standard provider and can be discovered next to other wallets."
            ),
            BrowserIntegrationOutcome::ProviderOnly => format!(
                "{name} exposes a standard provider but competes with other wallets for it."
            ),
            BrowserIntegrationOutcome::NotIntegrated => {
                format!("{name} cannot be used by web apps through the browser.")
            }
        }
    }
}

fn evaluate_browser_integration(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(integration) = ctx.features.browser_integration else {
        return Ok(ctx.unrated("browser_integration"));
    };

    let evaluation = match (integration.eip1193, integration.eip6963) {
        (true, true) => ctx.evaluation(
            BrowserIntegrationOutcome::MultiWalletDiscovery,
            "Supports EIP-1193 and EIP-6963.",
        ),
        (true, false) => ctx
            .evaluation(
                BrowserIntegrationOutcome::ProviderOnly,
                "Supports EIP-1193 without EIP-6963 discovery.",
            )
            .with_how_to_improve("Announce the provider through EIP-6963."),
        (false, true) => {
            return Err(ctx.contradiction(
                "browser_integration",
                "EIP-6963 discovery declared without an EIP-1193 provider",
            ))
        }
        (false, false) => ctx
            .evaluation(
                BrowserIntegrationOutcome::NotIntegrated,
                "Supports neither EIP-1193 nor EIP-6963.",
            )
            .with_how_to_improve("Inject an EIP-1193 provider and announce it via EIP-6963."),
    };
    Ok(evaluation)
}

fn browser_integration() -> Attribute {
    Attribute::new::<BrowserIntegrationOutcome>(
        "browser_integration",
        "Browser integration",
        evaluate_browser_integration,
    )
    .question("Can web apps talk to the wallet through standard browser interfaces?")
    .why_it_matters("Standard interfaces let users pick any wallet for any app.")
    .methodology(
        "EIP-1193 with EIP-6963 discovery passes; EIP-1193 alone is partial. Payment-only \
         wallets are exempt.",
    )
    .exempt_for(WalletProfile::Payments)
    .example(
        Rating::Pass,
        "Injected provider announced via EIP-6963.",
        BrowserIntegrationOutcome::MultiWalletDiscovery,
    )
    .example(
        Rating::Partial,
        "Overwrites window.ethereum.",
        BrowserIntegrationOutcome::ProviderOnly,
    )
    .example(
        Rating::Fail,
        "No injected provider.",
        BrowserIntegrationOutcome::NotIntegrated,
    )
}

// =========================================================================
// ADDRESS RESOLUTION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressResolutionOutcome {
    Full,
    Partial,
    NoResolution,
}

impl Outcome for AddressResolutionOutcome {
    const ALL: &'static [Self] = &[
        AddressResolutionOutcome::Full,
        AddressResolutionOutcome::Partial,
        AddressResolutionOutcome::NoResolution,
    ];

    fn id(self) -> &'static str {
        match self {
            AddressResolutionOutcome::Full => "full_resolution",
            AddressResolutionOutcome::Partial => "partial_resolution",
            AddressResolutionOutcome::NoResolution => "no_resolution",
        }
    }

    fn rating(self) -> Rating {
        match self {
            AddressResolutionOutcome::Full => Rating::Pass,
            AddressResolutionOutcome::Partial => Rating::Partial,
            AddressResolutionOutcome::NoResolution => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            AddressResolutionOutcome::Full => "Resolves names and chain addresses",
            AddressResolutionOutcome::Partial => "Partial address resolution",
            AddressResolutionOutcome::NoResolution => "Raw addresses only",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            AddressResolutionOutcome::Full => format!(
                "{name} resolves ENS names and chain-specific addresses when you send funds."
            ),
            AddressResolutionOutcome::Partial => {
                format!("{name} supports some human-readable address formats.")
            }
            AddressResolutionOutcome::NoResolution => {
                format!("{name} only accepts raw hexadecimal addresses.")
            }
        }
    }
}

fn evaluate_address_resolution(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(resolution) = ctx.features.address_resolution else {
        return Ok(ctx.unrated("address_resolution"));
    };

    let evaluation = match (resolution.ens, resolution.chain_specific_addresses) {
        (true, true) => ctx.evaluation(
            AddressResolutionOutcome::Full,
            "Resolves ENS names and chain-specific addresses.",
        ),
        (true, false) => ctx
            .evaluation(AddressResolutionOutcome::Partial, "Resolves ENS names only.")
            .with_how_to_improve("Support chain-specific address formats."),
        (false, true) => ctx
            .evaluation(
                AddressResolutionOutcome::Partial,
                "Accepts chain-specific addresses but not ENS names.",
            )
            .with_how_to_improve("Resolve ENS names."),
        (false, false) => ctx
            .evaluation(AddressResolutionOutcome::NoResolution, "No name resolution.")
            .with_impact("Users must copy long hexadecimal strings, inviting mistakes.")
            .with_how_to_improve("Resolve ENS names and chain-specific addresses."),
    };
    Ok(evaluation)
}

fn address_resolution() -> Attribute {
    Attribute::new::<AddressResolutionOutcome>(
        "address_resolution",
        "Address resolution",
        evaluate_address_resolution,
    )
    .question("Can you send to a human-readable name instead of a raw address?")
    .why_it_matters("Readable names and chain-aware addresses prevent costly send mistakes.")
    .methodology("Both ENS and chain-specific addresses pass; either one alone is partial.")
    .example(
        Rating::Pass,
        "ENS and chain-specific addresses.",
        AddressResolutionOutcome::Full,
    )
    .example(Rating::Partial, "ENS only.", AddressResolutionOutcome::Partial)
    .example(Rating::Fail, "Hex addresses only.", AddressResolutionOutcome::NoResolution)
}

// =========================================================================
// ACCOUNT ABSTRACTION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAbstractionOutcome {
    SmartAccounts,
    SomeSmartAccounts,
    EoaOnly,
}

impl Outcome for AccountAbstractionOutcome {
    const ALL: &'static [Self] = &[
        AccountAbstractionOutcome::SmartAccounts,
        AccountAbstractionOutcome::SomeSmartAccounts,
        AccountAbstractionOutcome::EoaOnly,
    ];

    fn id(self) -> &'static str {
        match self {
            AccountAbstractionOutcome::SmartAccounts => "smart_accounts",
            AccountAbstractionOutcome::SomeSmartAccounts => "some_smart_accounts",
            AccountAbstractionOutcome::EoaOnly => "eoa_only",
        }
    }

    fn rating(self) -> Rating {
        match self {
            AccountAbstractionOutcome::SmartAccounts => Rating::Pass,
            AccountAbstractionOutcome::SomeSmartAccounts => Rating::Partial,
            AccountAbstractionOutcome::EoaOnly => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            AccountAbstractionOutcome::SmartAccounts => "Smart accounts",
            AccountAbstractionOutcome::SomeSmartAccounts => "Some smart account support",
            AccountAbstractionOutcome::EoaOnly => "EOA only",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            AccountAbstractionOutcome::SmartAccounts => {
                format!("{name} supports both ERC-4337 and EIP-7702 smart accounts.")
            }
            AccountAbstractionOutcome::SomeSmartAccounts => {
                format!("{name} supports one smart account standard.")
            }
            AccountAbstractionOutcome::EoaOnly => {
                format!("{name} only supports externally owned accounts.")
            }
        }
    }
}

fn evaluate_account_abstraction(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(accounts) = ctx.features.account_support else {
        return Ok(ctx.unrated("account_support"));
    };

    let evaluation = match (accounts.erc4337, accounts.eip7702) {
        (true, true) => ctx.evaluation(
            AccountAbstractionOutcome::SmartAccounts,
            "Supports ERC-4337 and EIP-7702.",
        ),
        (true, false) | (false, true) => {
            let standard = if accounts.erc4337 { "ERC-4337" } else { "EIP-7702" };
            ctx.evaluation(
                AccountAbstractionOutcome::SomeSmartAccounts,
                format!("Supports {standard} only."),
            )
            .with_how_to_improve("Support both ERC-4337 and EIP-7702.")
        }
        (false, false) if accounts.eoa => ctx
            .evaluation(
                AccountAbstractionOutcome::EoaOnly,
                "Only externally owned accounts are supported.",
            )
            .with_impact("Users miss out on batching, sponsored gas and key rotation.")
            .with_how_to_improve("Add smart account support."),
        (false, false) => {
            return Err(ctx.contradiction(
                "account_abstraction",
                "no account type is supported",
            ))
        }
    };
    Ok(evaluation)
}

fn account_abstraction() -> Attribute {
    Attribute::new::<AccountAbstractionOutcome>(
        "account_abstraction",
        "Account abstraction",
        evaluate_account_abstraction,
    )
    .question("Does the wallet support smart accounts?")
    .why_it_matters("Smart accounts enable recovery, batching and gas sponsorship.")
    .methodology("Both ERC-4337 and EIP-7702 pass; one of them is partial.")
    .example(
        Rating::Pass,
        "4337 accounts with 7702 upgrades.",
        AccountAbstractionOutcome::SmartAccounts,
    )
    .example(
        Rating::Partial,
        "4337 accounts only.",
        AccountAbstractionOutcome::SomeSmartAccounts,
    )
    .example(Rating::Fail, "EOAs only.", AccountAbstractionOutcome::EoaOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::test_support::{evaluate, outcome_of};
    use crate::declaration::{AccountSupport, AddressResolution, BrowserIntegration, WalletFeatures};
    use crate::feature::Feature;

    fn with_browser(eip1193: bool, eip6963: bool) -> WalletFeatures {
        WalletFeatures {
            browser_integration: Feature::uniform(BrowserIntegration { eip1193, eip6963 }),
            ..Default::default()
        }
    }

    #[test]
    fn test_browser_integration_outcomes() {
        let attribute = browser_integration();
        assert_eq!(outcome_of(&attribute, &with_browser(true, true)), "multi_wallet_discovery");
        assert_eq!(outcome_of(&attribute, &with_browser(true, false)), "provider_only");
        assert_eq!(outcome_of(&attribute, &with_browser(false, false)), "not_integrated");
    }

    #[test]
    fn test_discovery_without_provider_is_contradiction() {
        let result = evaluate(
            &browser_integration(),
            WalletProfile::Generic,
            &with_browser(false, true),
        );
        assert!(matches!(result, Err(RatingError::ContradictoryFacts { .. })));
    }

    #[test]
    fn test_payments_wallet_exempt_regardless_of_facts() {
        let attribute = browser_integration();
        for features in [WalletFeatures::default(), with_browser(false, true)] {
            let evaluation = evaluate(&attribute, WalletProfile::Payments, &features).unwrap();
            assert_eq!(evaluation.rating(), Rating::Exempt);
        }
    }

    #[test]
    fn test_address_resolution_outcomes() {
        let attribute = address_resolution();
        let with = |ens, chain_specific_addresses| WalletFeatures {
            address_resolution: Feature::uniform(AddressResolution {
                ens,
                chain_specific_addresses,
            }),
            ..Default::default()
        };
        assert_eq!(outcome_of(&attribute, &with(true, true)), "full_resolution");
        assert_eq!(outcome_of(&attribute, &with(false, true)), "partial_resolution");
        assert_eq!(outcome_of(&attribute, &with(false, false)), "no_resolution");
    }

    #[test]
    fn test_account_abstraction_outcomes() {
        let attribute = account_abstraction();
        let with = |eoa, erc4337, eip7702| WalletFeatures {
            account_support: Feature::uniform(AccountSupport {
                eoa,
                erc4337,
                eip7702,
            }),
            ..Default::default()
        };
        assert_eq!(outcome_of(&attribute, &with(true, true, true)), "smart_accounts");
        assert_eq!(outcome_of(&attribute, &with(true, false, true)), "some_smart_accounts");
        assert_eq!(outcome_of(&attribute, &with(true, false, false)), "eoa_only");
        assert!(evaluate(&attribute, WalletProfile::Generic, &with(false, false, false)).is_err());
    }
}
