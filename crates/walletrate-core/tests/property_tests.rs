//! Property-based tests for rating guarantees.
//!
//! The default merge MUST satisfy:
//! 1. Singleton identity: merge({v: e}) == e
//! 2. Order independence: insertion order never changes the result
//! 3. Severity: any FAIL input yields FAIL; a shared rating is preserved
//!
//! Evaluators MUST only produce outcomes from their declared space.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use walletrate_core::declaration::{
    AccountSupport, AddressPrivacy, AddressResolution, BrowserIntegration, BugBountyAvailability,
    BugBountyProgram, ChainConfigurability, ClearSigning, FeeDisplay, FlawSeverity, FundingSource,
    HardwareWalletVendor, LeakedData, License, MultiAddressHandling, PrivacyLeak,
    RpcEndpointConfiguration, ScamPrevention, SecurityAudit, SourceVisibility, UnpatchedFlaw,
};
use walletrate_core::{
    pick_worst, AttributeRegistry, Evaluation, EvaluationContext, Feature, RatedWallet, Rating,
    RatingError, Value, Variant, VariantMap, WalletDeclaration, WalletFeatures, WalletMetadata,
    WalletProfile,
};

// =============================================================================
// Strategy helpers
// =============================================================================

fn wallet() -> WalletMetadata {
    WalletMetadata {
        id: "prop_wallet".to_string(),
        display_name: "Prop Wallet".to_string(),
        url: None,
        repository_url: None,
    }
}

fn variant_strategy() -> impl Strategy<Value = Variant> {
    prop_oneof![
        Just(Variant::Mobile),
        Just(Variant::Desktop),
        Just(Variant::Browser),
    ]
}

fn rating_strategy() -> impl Strategy<Value = Rating> {
    prop_oneof![
        Just(Rating::Pass),
        Just(Rating::Partial),
        Just(Rating::Fail),
        Just(Rating::Unrated),
        Just(Rating::Exempt),
    ]
}

/// An evaluation whose outcome id encodes its rating and a tag.
fn evaluation_strategy() -> impl Strategy<Value = Evaluation> {
    (rating_strategy(), 0..3usize).prop_map(|(rating, tag)| {
        let ids: [&'static str; 3] = ["first", "second", "third"];
        let mut value = Value::unrated(&wallet());
        value.id = ids[tag];
        value.rating = rating;
        Evaluation::new(value, format!("{rating} {tag}"))
    })
}

/// Up to three distinct variants with evaluations, as an insertion-ordered list.
fn entries_strategy() -> impl Strategy<Value = Vec<(Variant, Evaluation)>> {
    prop::collection::btree_map(variant_strategy(), evaluation_strategy(), 1..=3)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn uniform<T>(value: Option<T>) -> Feature<T> {
    value.map(Feature::uniform).unwrap_or_default()
}

fn license_strategy() -> impl Strategy<Value = License> {
    prop_oneof![
        Just(License::Mit),
        Just(License::Gpl3),
        Just(License::Busl),
        Just(License::Proprietary),
        Just(License::Unlicensed),
    ]
}

fn visibility_strategy() -> impl Strategy<Value = SourceVisibility> {
    prop_oneof![Just(SourceVisibility::Public), Just(SourceVisibility::Private)]
}

fn severity_strategy() -> impl Strategy<Value = FlawSeverity> {
    prop_oneof![
        Just(FlawSeverity::Low),
        Just(FlawSeverity::Medium),
        Just(FlawSeverity::High),
        Just(FlawSeverity::Critical),
    ]
}

fn audits_strategy() -> impl Strategy<Value = Vec<SecurityAudit>> {
    prop::collection::vec(
        (1..=28u32, prop::collection::vec(severity_strategy(), 0..3)),
        0..3,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(day, severities)| SecurityAudit {
                auditor: format!("Auditor {day}"),
                date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
                report_url: None,
                unpatched_flaws: severities
                    .into_iter()
                    .map(|severity| UnpatchedFlaw {
                        name: "flaw".to_string(),
                        severity,
                    })
                    .collect(),
            })
            .collect()
    })
}

fn vendors_strategy() -> impl Strategy<Value = BTreeSet<HardwareWalletVendor>> {
    prop::collection::btree_set(
        prop_oneof![
            Just(HardwareWalletVendor::Ledger),
            Just(HardwareWalletVendor::Trezor),
            Just(HardwareWalletVendor::Keystone),
        ],
        0..3,
    )
}

fn clear_signing_strategy() -> impl Strategy<Value = ClearSigning> {
    prop_oneof![
        Just(ClearSigning::Full),
        Just(ClearSigning::Partial),
        Just(ClearSigning::BlindOnly),
    ]
}

fn bug_bounty_strategy() -> impl Strategy<Value = BugBountyProgram> {
    (
        prop_oneof![
            Just(BugBountyAvailability::Never),
            Just(BugBountyAvailability::Inactive),
            Just(BugBountyAvailability::Active),
        ],
        any::<bool>(),
    )
        .prop_map(|(availability, rewards)| BugBountyProgram {
            availability,
            rewards,
        })
}

fn leaks_strategy() -> impl Strategy<Value = AddressPrivacy> {
    prop::collection::vec(
        (
            "[a-z]{3,8}",
            prop::collection::btree_set(
                prop_oneof![
                    Just(LeakedData::WalletAddress),
                    Just(LeakedData::IpAddress),
                    Just(LeakedData::Email),
                ],
                0..3,
            ),
        ),
        0..3,
    )
    .prop_map(|leaks| AddressPrivacy {
        leaks: leaks
            .into_iter()
            .map(|(party, data)| PrivacyLeak { party, data })
            .collect(),
    })
}

fn chains_strategy() -> impl Strategy<Value = ChainConfigurability> {
    (
        prop_oneof![
            Just(RpcEndpointConfiguration::Never),
            Just(RpcEndpointConfiguration::AfterOnboarding),
            Just(RpcEndpointConfiguration::DuringOnboarding),
        ],
        any::<bool>(),
    )
        .prop_map(|(l1_rpc_endpoint, custom_chains)| ChainConfigurability {
            l1_rpc_endpoint,
            custom_chains,
        })
}

fn funding_strategy() -> impl Strategy<Value = Vec<FundingSource>> {
    prop::collection::vec(
        prop_oneof![
            Just(FundingSource::Grants),
            Just(FundingSource::Venture),
            Just(FundingSource::Undisclosed),
        ],
        0..3,
    )
}

/// Random facts, each independently present or undetermined.
fn features_strategy() -> impl Strategy<Value = WalletFeatures> {
    let security = (
        prop::option::of(audits_strategy()),
        prop::option::of(vendors_strategy()),
        prop::option::of(clear_signing_strategy()),
        prop::option::of(bug_bounty_strategy()),
        prop::option::of(
            (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(a, b, c)| ScamPrevention {
                scam_url_warning: a,
                contract_address_warning: b,
                first_transfer_warning: c,
            }),
        ),
    );
    let privacy_and_sovereignty = (
        prop::option::of(leaks_strategy()),
        prop::option::of(prop_oneof![
            Just(MultiAddressHandling::Batched),
            Just(MultiAddressHandling::Separate),
            Just(MultiAddressHandling::Isolated),
        ]),
        prop::option::of(chains_strategy()),
    );
    let transparency = (
        prop::option::of(license_strategy()),
        prop::option::of(visibility_strategy()),
        prop::option::of(funding_strategy()),
        prop::option::of(prop_oneof![
            Just(FeeDisplay::None),
            Just(FeeDisplay::TotalOnly),
            Just(FeeDisplay::Itemized),
        ]),
    );
    let ecosystem = (
        prop::option::of((any::<bool>(), any::<bool>())),
        prop::option::of((any::<bool>(), any::<bool>())),
        prop::option::of((any::<bool>(), any::<bool>(), any::<bool>())),
    );

    (security, privacy_and_sovereignty, transparency, ecosystem).prop_map(
        |(
            (audits, vendors, clear_signing, bug_bounty, scams),
            (leaks, multi_address, chains),
            (license, visibility, funding, fees),
            (browser, resolution, accounts),
        )| WalletFeatures {
            license: uniform(license),
            source_visibility: uniform(visibility),
            security_audits: uniform(audits),
            hardware_wallet_support: uniform(vendors),
            hardware_wallet_clear_signing: uniform(clear_signing),
            bug_bounty_program: uniform(bug_bounty),
            scam_prevention: uniform(scams),
            address_privacy: uniform(leaks),
            multi_address: uniform(multi_address),
            chain_configurability: uniform(chains),
            funding: uniform(funding),
            fee_display: uniform(fees),
            browser_integration: uniform(
                browser.map(|(eip1193, eip6963)| BrowserIntegration { eip1193, eip6963 }),
            ),
            address_resolution: uniform(resolution.map(|(ens, chain_specific_addresses)| {
                AddressResolution {
                    ens,
                    chain_specific_addresses,
                }
            })),
            account_support: uniform(accounts.map(|(eoa, erc4337, eip7702)| AccountSupport {
                eoa,
                erc4337,
                eip7702,
            })),
        },
    )
}

fn profile_strategy() -> impl Strategy<Value = WalletProfile> {
    prop_oneof![Just(WalletProfile::Generic), Just(WalletProfile::Payments)]
}

fn declaration(
    profile: WalletProfile,
    variants: &[Variant],
    features: WalletFeatures,
) -> WalletDeclaration {
    WalletDeclaration {
        metadata: wallet(),
        profile,
        variants: variants.iter().copied().collect(),
        features,
    }
}

// =============================================================================
// Default merge
// =============================================================================

proptest! {
    #[test]
    fn prop_merge_singleton_is_identity(variant in variant_strategy(), evaluation in evaluation_strategy()) {
        let map: VariantMap<Evaluation> = [(variant, evaluation.clone())].into_iter().collect();
        prop_assert_eq!(pick_worst(&map), Some(evaluation));
    }

    #[test]
    fn prop_merge_order_independent(entries in entries_strategy()) {
        let forward: VariantMap<Evaluation> = entries.iter().cloned().collect();
        let backward: VariantMap<Evaluation> = entries.iter().rev().cloned().collect();
        prop_assert_eq!(pick_worst(&forward), pick_worst(&backward));
    }

    #[test]
    fn prop_merge_fail_dominates(entries in entries_strategy()) {
        let map: VariantMap<Evaluation> = entries.into_iter().collect();
        let merged = pick_worst(&map).unwrap();
        if map.values().any(|e| e.rating() == Rating::Fail) {
            prop_assert_eq!(merged.rating(), Rating::Fail);
        }
    }

    #[test]
    fn prop_merge_preserves_shared_rating(entries in entries_strategy()) {
        let map: VariantMap<Evaluation> = entries.into_iter().collect();
        let merged = pick_worst(&map).unwrap();
        let ratings: BTreeSet<Rating> = map.values().map(|e| e.rating()).collect();
        if ratings.len() == 1 {
            prop_assert!(ratings.contains(&merged.rating()));
        }
    }

    #[test]
    fn prop_merge_returns_an_input(entries in entries_strategy()) {
        let map: VariantMap<Evaluation> = entries.into_iter().collect();
        let merged = pick_worst(&map).unwrap();
        prop_assert!(map.values().any(|e| *e == merged));
    }
}

// =============================================================================
// Evaluation
// =============================================================================

proptest! {
    #[test]
    fn prop_outcomes_within_declared_space(
        features in features_strategy(),
        profile in profile_strategy(),
        variant in variant_strategy(),
    ) {
        let registry = AttributeRegistry::standard().unwrap();
        let metadata = wallet();
        let ctx = EvaluationContext {
            wallet: &metadata,
            profile,
            variant,
            features: features.resolve(variant),
        };

        for attribute in registry.attributes() {
            match attribute.evaluate_checked(&ctx) {
                Ok(evaluation) => {
                    let declared = attribute.outcome(evaluation.value.id);
                    prop_assert!(declared.is_some());
                    prop_assert_eq!(declared.unwrap().rating, evaluation.rating());
                    if attribute.is_exempt(profile) {
                        prop_assert_eq!(evaluation.rating(), Rating::Exempt);
                    }
                }
                Err(RatingError::ContradictoryFacts { attribute: id, .. }) => {
                    prop_assert_eq!(id, attribute.id);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn prop_single_variant_round_trip(
        features in features_strategy(),
        variant in variant_strategy(),
    ) {
        let registry = AttributeRegistry::standard().unwrap();
        let declaration = declaration(WalletProfile::Generic, &[variant], features);
        if let Ok(rated) = RatedWallet::rate(&registry, &declaration) {
            prop_assert_eq!(&rated.overall, &rated.variants[&variant]);
            prop_assert!(rated.divergences[&variant].is_empty());
        }
    }

    #[test]
    fn prop_uniform_facts_never_diverge(features in features_strategy()) {
        let registry = AttributeRegistry::standard().unwrap();
        let declaration = declaration(WalletProfile::Generic, &Variant::ALL, features);
        if let Ok(rated) = RatedWallet::rate(&registry, &declaration) {
            prop_assert_eq!(rated.divergences.len(), 3);
            prop_assert!(rated.divergences.values().all(|set| set.is_empty()));
        }
    }

    #[test]
    fn prop_uniform_resolves_everywhere(license in license_strategy(), variant in variant_strategy()) {
        let feature = Feature::uniform(license);
        prop_assert_eq!(feature.resolve(variant), Some(&license));
    }

    #[test]
    fn prop_scores_in_unit_interval(features in features_strategy(), profile in profile_strategy()) {
        let registry = AttributeRegistry::standard().unwrap();
        let declaration = declaration(profile, &[Variant::Mobile, Variant::Browser], features);
        if let Ok(rated) = RatedWallet::rate(&registry, &declaration) {
            if let Some(overall) = rated.score(&registry).unwrap() {
                prop_assert!((0.0..=1.0).contains(&overall.score));
                for group in overall.groups.values() {
                    prop_assert!((0.0..=1.0).contains(&group.score));
                }
            }
        }
    }
}
