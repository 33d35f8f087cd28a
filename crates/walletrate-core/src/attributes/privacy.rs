//! Privacy attributes.
//!
//! **Question**: Can third parties link the user's addresses to each other
//! or to a real-world identity?

use crate::declaration::{MultiAddressHandling, PrivacyLeak};
use crate::types::{Evaluation, Rating, WalletMetadata};
use crate::RatingError;

use super::{Attribute, AttributeGroup, EvaluationContext, Outcome};

pub(crate) fn group() -> AttributeGroup {
    AttributeGroup::new(
        "privacy",
        "Privacy",
        [
            (address_correlation(), 2.0),
            (multi_address_correlation(), 1.0),
        ],
    )
}

// =========================================================================
// ADDRESS CORRELATION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressCorrelationOutcome {
    NoLeaks,
    AddressVisible,
    Correlated,
}

impl Outcome for AddressCorrelationOutcome {
    const ALL: &'static [Self] = &[
        AddressCorrelationOutcome::NoLeaks,
        AddressCorrelationOutcome::AddressVisible,
        AddressCorrelationOutcome::Correlated,
    ];

    fn id(self) -> &'static str {
        match self {
            AddressCorrelationOutcome::NoLeaks => "no_leaks",
            AddressCorrelationOutcome::AddressVisible => "address_visible",
            AddressCorrelationOutcome::Correlated => "correlated",
        }
    }

    fn rating(self) -> Rating {
        match self {
            AddressCorrelationOutcome::NoLeaks => Rating::Pass,
            AddressCorrelationOutcome::AddressVisible => Rating::Partial,
            AddressCorrelationOutcome::Correlated => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            AddressCorrelationOutcome::NoLeaks => "Address stays private",
            AddressCorrelationOutcome::AddressVisible => "Address visible to third parties",
            AddressCorrelationOutcome::Correlated => "Address linkable to identity",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            AddressCorrelationOutcome::NoLeaks => {
                format!("{name} does not reveal your address to third parties.")
            }
            AddressCorrelationOutcome::AddressVisible => format!(
                "{name} reveals your address to third parties, but not alongside your IP \
                 address or email."
            ),
            AddressCorrelationOutcome::Correlated => format!(
                "{name} lets third parties link your address to your IP address or email."
            ),
        }
    }
}

fn parties<'a>(leaks: impl Iterator<Item = &'a PrivacyLeak>) -> String {
    leaks.map(|l| l.party.as_str()).collect::<Vec<_>>().join(", ")
}

fn evaluate_address_correlation(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(privacy) = ctx.features.address_privacy else {
        return Ok(ctx.unrated("address_privacy"));
    };

    let correlating: Vec<&PrivacyLeak> = privacy
        .leaks
        .iter()
        .filter(|l| l.correlates_address())
        .collect();
    if !correlating.is_empty() {
        return Ok(ctx
            .evaluation(
                AddressCorrelationOutcome::Correlated,
                format!(
                    "Address and identifying data are sent to: {}.",
                    parties(correlating.into_iter())
                ),
            )
            .with_impact("Your on-chain activity can be tied to who and where you are.")
            .with_how_to_improve(
                "Proxy requests so third parties never see addresses with IPs or emails.",
            ));
    }

    if privacy.leaks.iter().any(|l| l.sees_address()) {
        return Ok(ctx
            .evaluation(
                AddressCorrelationOutcome::AddressVisible,
                format!(
                    "Addresses are sent to: {}.",
                    parties(privacy.leaks.iter().filter(|l| l.sees_address()))
                ),
            )
            .with_how_to_improve("Query address data through a self-hosted or private node."));
    }

    Ok(ctx.evaluation(
        AddressCorrelationOutcome::NoLeaks,
        "No third party receives the wallet address.",
    ))
}

fn address_correlation() -> Attribute {
    Attribute::new::<AddressCorrelationOutcome>(
        "address_correlation",
        "Address correlation",
        evaluate_address_correlation,
    )
    .question("Can third parties link your address to your identity?")
    .why_it_matters("A linked address exposes your entire financial history to whoever holds it.")
    .methodology(
        "Looks at every third party receiving data during normal use. Any party receiving \
         the address together with an IP address or email fails.",
    )
    .example(
        Rating::Pass,
        "All requests go through the user's own node.",
        AddressCorrelationOutcome::NoLeaks,
    )
    .example(
        Rating::Partial,
        "A proxied indexer sees addresses but not IPs.",
        AddressCorrelationOutcome::AddressVisible,
    )
    .example(
        Rating::Fail,
        "A default RPC provider logs addresses and IPs.",
        AddressCorrelationOutcome::Correlated,
    )
}

// =========================================================================
// MULTI-ADDRESS CORRELATION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiAddressOutcome {
    Isolated,
    SeparateRequests,
    Batched,
}

impl Outcome for MultiAddressOutcome {
    const ALL: &'static [Self] = &[
        MultiAddressOutcome::Isolated,
        MultiAddressOutcome::SeparateRequests,
        MultiAddressOutcome::Batched,
    ];

    fn id(self) -> &'static str {
        match self {
            MultiAddressOutcome::Isolated => "isolated",
            MultiAddressOutcome::SeparateRequests => "separate_requests",
            MultiAddressOutcome::Batched => "batched",
        }
    }

    fn rating(self) -> Rating {
        match self {
            MultiAddressOutcome::Isolated => Rating::Pass,
            MultiAddressOutcome::SeparateRequests => Rating::Partial,
            MultiAddressOutcome::Batched => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            MultiAddressOutcome::Isolated => "Addresses isolated",
            MultiAddressOutcome::SeparateRequests => "Addresses queried separately",
            MultiAddressOutcome::Batched => "Addresses queried together",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            MultiAddressOutcome::Isolated => {
                format!("{name} queries each of your addresses over an isolated connection.")
            }
            MultiAddressOutcome::SeparateRequests => format!(
                "{name} queries your addresses one at a time, but over a shared connection."
            ),
            MultiAddressOutcome::Batched => {
                format!("{name} queries all your addresses in the same request.")
            }
        }
    }
}

fn evaluate_multi_address_correlation(
    ctx: &EvaluationContext<'_>,
) -> Result<Evaluation, RatingError> {
    let Some(handling) = ctx.features.multi_address else {
        return Ok(ctx.unrated("multi_address"));
    };

    let evaluation = match handling {
        MultiAddressHandling::Isolated => ctx.evaluation(
            MultiAddressOutcome::Isolated,
            "Each address uses its own connection or proxy circuit.",
        ),
        MultiAddressHandling::Separate => ctx
            .evaluation(
                MultiAddressOutcome::SeparateRequests,
                "Requests are split per address but share a connection.",
            )
            .with_how_to_improve("Route each address over a separate proxy circuit."),
        MultiAddressHandling::Batched => ctx
            .evaluation(
                MultiAddressOutcome::Batched,
                "All addresses are sent in one request.",
            )
            .with_impact("Data providers learn that your addresses belong to the same person.")
            .with_how_to_improve("Query each address in its own request."),
    };
    Ok(evaluation)
}

fn multi_address_correlation() -> Attribute {
    Attribute::new::<MultiAddressOutcome>(
        "multi_address_correlation",
        "Multi-address correlation",
        evaluate_multi_address_correlation,
    )
    .question("Can third parties tell that your addresses belong together?")
    .why_it_matters("Using several addresses only helps privacy if they cannot be linked.")
    .methodology("Rated on how the wallet fetches data for a user with several addresses.")
    .example(
        Rating::Pass,
        "One Tor circuit per address.",
        MultiAddressOutcome::Isolated,
    )
    .example(
        Rating::Partial,
        "One request per address over the same connection.",
        MultiAddressOutcome::SeparateRequests,
    )
    .example(
        Rating::Fail,
        "Portfolio fetched in a single batched call.",
        MultiAddressOutcome::Batched,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::test_support::{evaluate, outcome_of};
    use crate::declaration::{AddressPrivacy, LeakedData, WalletFeatures};
    use crate::feature::Feature;
    use crate::types::WalletProfile;

    fn leak(party: &str, data: &[LeakedData]) -> PrivacyLeak {
        PrivacyLeak {
            party: party.to_string(),
            data: data.iter().copied().collect(),
        }
    }

    fn with_leaks(leaks: Vec<PrivacyLeak>) -> WalletFeatures {
        WalletFeatures {
            address_privacy: Feature::uniform(AddressPrivacy { leaks }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_leaks_passes() {
        assert_eq!(
            outcome_of(&address_correlation(), &with_leaks(vec![])),
            "no_leaks"
        );
    }

    #[test]
    fn test_ip_only_leak_is_not_an_address_leak() {
        let features = with_leaks(vec![leak("Analytics", &[LeakedData::IpAddress])]);
        assert_eq!(outcome_of(&address_correlation(), &features), "no_leaks");
    }

    #[test]
    fn test_address_without_identity_is_partial() {
        let features = with_leaks(vec![leak("Indexer", &[LeakedData::WalletAddress])]);
        assert_eq!(outcome_of(&address_correlation(), &features), "address_visible");
    }

    #[test]
    fn test_correlating_leak_fails_and_names_party() {
        let features = with_leaks(vec![
            leak("Indexer", &[LeakedData::WalletAddress]),
            leak("Infura", &[LeakedData::WalletAddress, LeakedData::IpAddress]),
        ]);
        let evaluation =
            evaluate(&address_correlation(), WalletProfile::Generic, &features).unwrap();
        assert_eq!(evaluation.value.id, "correlated");
        assert!(evaluation.details.contains("Infura"));
        assert!(!evaluation.details.contains("Indexer"));
    }

    #[test]
    fn test_multi_address_outcomes() {
        let attribute = multi_address_correlation();
        let with = |handling| WalletFeatures {
            multi_address: Feature::uniform(handling),
            ..Default::default()
        };
        assert_eq!(outcome_of(&attribute, &with(MultiAddressHandling::Batched)), "batched");
        assert_eq!(
            outcome_of(&attribute, &with(MultiAddressHandling::Separate)),
            "separate_requests"
        );
        assert_eq!(outcome_of(&attribute, &with(MultiAddressHandling::Isolated)), "isolated");
        assert_eq!(outcome_of(&attribute, &WalletFeatures::default()), "unrated");
    }
}
