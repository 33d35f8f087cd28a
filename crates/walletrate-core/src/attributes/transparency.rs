//! Transparency attributes.
//!
//! **Question**: Can users see what the wallet does, who pays for it and
//! what it charges?

use crate::declaration::{FeeDisplay, FundingSource, License, SourceVisibility};
use crate::types::{Evaluation, Rating, WalletMetadata};
use crate::RatingError;

use super::{Attribute, AttributeGroup, EvaluationContext, Outcome};

pub(crate) fn group() -> AttributeGroup {
    AttributeGroup::new(
        "transparency",
        "Transparency",
        [
            (open_source(), 2.0),
            (source_visibility(), 2.0),
            (funding(), 1.0),
            (fee_transparency(), 1.0),
        ],
    )
}

// =========================================================================
// OPEN SOURCE
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenSourceOutcome {
    OpenSource,
    SourceAvailable,
    Proprietary,
}

impl Outcome for OpenSourceOutcome {
    const ALL: &'static [Self] = &[
        OpenSourceOutcome::OpenSource,
        OpenSourceOutcome::SourceAvailable,
        OpenSourceOutcome::Proprietary,
    ];

    fn id(self) -> &'static str {
        match self {
            OpenSourceOutcome::OpenSource => "open_source",
            OpenSourceOutcome::SourceAvailable => "source_available",
            OpenSourceOutcome::Proprietary => "proprietary",
        }
    }

    fn rating(self) -> Rating {
        match self {
            OpenSourceOutcome::OpenSource => Rating::Pass,
            OpenSourceOutcome::SourceAvailable => Rating::Partial,
            OpenSourceOutcome::Proprietary => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            OpenSourceOutcome::OpenSource => "Open source",
            OpenSourceOutcome::SourceAvailable => "Source available",
            OpenSourceOutcome::Proprietary => "Proprietary",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            OpenSourceOutcome::OpenSource => {
                format!("{name} is licensed under a free and open source license.")
            }
            OpenSourceOutcome::SourceAvailable => format!(
                "{name}'s source can be read but its license restricts reuse."
            ),
            OpenSourceOutcome::Proprietary => {
                format!("{name} is not licensed for others to use or modify.")
            }
        }
    }

    fn icon(self) -> Option<&'static str> {
        match self {
            OpenSourceOutcome::OpenSource => Some("\u{2696}"),
            _ => None,
        }
    }
}

fn evaluate_open_source(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(license) = ctx.features.license.copied() else {
        return Ok(ctx.unrated("license"));
    };
    let Some(visibility) = ctx.features.source_visibility.copied() else {
        return Ok(ctx.unrated("source_visibility"));
    };

    if license.is_free() && visibility == SourceVisibility::Private {
        return Err(ctx.contradiction(
            "open_source",
            format!("{} license declared for private source", license.as_str()),
        ));
    }

    let details = format!("Licensed under {}.", license.as_str());
    let evaluation = match license {
        l if l.is_free() => ctx.evaluation(OpenSourceOutcome::OpenSource, details),
        License::Busl => ctx
            .evaluation(OpenSourceOutcome::SourceAvailable, details)
            .with_how_to_improve("Relicense under a free and open source license."),
        _ => ctx
            .evaluation(OpenSourceOutcome::Proprietary, details)
            .with_impact("Nobody may fork the wallet if its developers abandon it.")
            .with_how_to_improve("Release the source under a free and open source license."),
    };
    Ok(evaluation)
}

fn open_source() -> Attribute {
    Attribute::new::<OpenSourceOutcome>("open_source", "Open source", evaluate_open_source)
        .question("Is the wallet's source code licensed as free and open source software?")
        .why_it_matters(
            "An open license lets anyone audit, fix and fork the wallet, including after \
             its developers move on.",
        )
        .methodology(
            "Rated on the declared license. Source-available licenses such as BUSL are partial.",
        )
        .example(Rating::Pass, "MIT licensed.", OpenSourceOutcome::OpenSource)
        .example(
            Rating::Partial,
            "BUSL with a delayed change date.",
            OpenSourceOutcome::SourceAvailable,
        )
        .example(
            Rating::Fail,
            "All rights reserved.",
            OpenSourceOutcome::Proprietary,
        )
}

// =========================================================================
// SOURCE VISIBILITY
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceVisibilityOutcome {
    Public,
    Private,
}

impl Outcome for SourceVisibilityOutcome {
    const ALL: &'static [Self] = &[SourceVisibilityOutcome::Public, SourceVisibilityOutcome::Private];

    fn id(self) -> &'static str {
        match self {
            SourceVisibilityOutcome::Public => "public",
            SourceVisibilityOutcome::Private => "private",
        }
    }

    fn rating(self) -> Rating {
        match self {
            SourceVisibilityOutcome::Public => Rating::Pass,
            SourceVisibilityOutcome::Private => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            SourceVisibilityOutcome::Public => "Source is public",
            SourceVisibilityOutcome::Private => "Source is private",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            SourceVisibilityOutcome::Public => format!("{name}'s source code is publicly visible."),
            SourceVisibilityOutcome::Private => format!("{name}'s source code is not public."),
        }
    }
}

fn evaluate_source_visibility(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(visibility) = ctx.features.source_visibility else {
        return Ok(ctx.unrated("source_visibility"));
    };

    let evaluation = match visibility {
        SourceVisibility::Public => {
            let details = match &ctx.wallet.repository_url {
                Some(url) => format!("Source is published at {url}."),
                None => "Source is published.".to_string(),
            };
            ctx.evaluation(SourceVisibilityOutcome::Public, details)
        }
        SourceVisibility::Private => ctx
            .evaluation(SourceVisibilityOutcome::Private, "Source is not published.")
            .with_impact("Nobody outside the developers can check what the wallet does.")
            .with_how_to_improve("Publish the wallet's source code."),
    };
    Ok(evaluation)
}

fn source_visibility() -> Attribute {
    Attribute::new::<SourceVisibilityOutcome>(
        "source_visibility",
        "Source visibility",
        evaluate_source_visibility,
    )
    .question("Can anyone read the wallet's source code?")
    .why_it_matters("Public source is the precondition for independent review.")
    .methodology("Public source passes, regardless of license.")
    .example(
        Rating::Pass,
        "Repository on a public forge.",
        SourceVisibilityOutcome::Public,
    )
    .example(Rating::Fail, "Closed source.", SourceVisibilityOutcome::Private)
}

// =========================================================================
// FUNDING
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingOutcome {
    Disclosed,
    PartiallyDisclosed,
    Undisclosed,
}

impl Outcome for FundingOutcome {
    const ALL: &'static [Self] = &[
        FundingOutcome::Disclosed,
        FundingOutcome::PartiallyDisclosed,
        FundingOutcome::Undisclosed,
    ];

    fn id(self) -> &'static str {
        match self {
            FundingOutcome::Disclosed => "disclosed",
            FundingOutcome::PartiallyDisclosed => "partially_disclosed",
            FundingOutcome::Undisclosed => "undisclosed",
        }
    }

    fn rating(self) -> Rating {
        match self {
            FundingOutcome::Disclosed => Rating::Pass,
            FundingOutcome::PartiallyDisclosed => Rating::Partial,
            FundingOutcome::Undisclosed => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            FundingOutcome::Disclosed => "Funding disclosed",
            FundingOutcome::PartiallyDisclosed => "Funding partially disclosed",
            FundingOutcome::Undisclosed => "Funding undisclosed",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            FundingOutcome::Disclosed => format!("{name} discloses how it is funded."),
            FundingOutcome::PartiallyDisclosed => {
                format!("{name} discloses some, but not all, of its funding sources.")
            }
            FundingOutcome::Undisclosed => format!("{name} does not disclose how it is funded."),
        }
    }
}

fn evaluate_funding(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(sources) = ctx.features.funding else {
        return Ok(ctx.unrated("funding"));
    };

    let undisclosed = sources.contains(&FundingSource::Undisclosed);
    let mut disclosed: Vec<FundingSource> = sources
        .iter()
        .copied()
        .filter(|s| *s != FundingSource::Undisclosed)
        .collect();
    disclosed.sort_unstable();
    disclosed.dedup();
    let listed = disclosed
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let evaluation = match (disclosed.is_empty(), undisclosed) {
        (true, _) => ctx
            .evaluation(FundingOutcome::Undisclosed, "No funding source is disclosed.")
            .with_impact("Users cannot judge whose interests the wallet serves.")
            .with_how_to_improve("Publish the wallet's funding sources."),
        (false, true) => ctx
            .evaluation(
                FundingOutcome::PartiallyDisclosed,
                format!("Disclosed sources: {listed}; others are undisclosed."),
            )
            .with_how_to_improve("Disclose every funding source."),
        (false, false) => ctx.evaluation(
            FundingOutcome::Disclosed,
            format!("Disclosed sources: {listed}."),
        ),
    };
    Ok(evaluation)
}

fn funding() -> Attribute {
    Attribute::new::<FundingOutcome>("funding", "Funding", evaluate_funding)
        .question("Does the wallet disclose how it is funded?")
        .why_it_matters("Funding shapes incentives, including incentives to monetise user data.")
        .methodology(
            "Every funding source disclosed passes. A mix of disclosed and undisclosed \
             sources is partial.",
        )
        .example(
            Rating::Pass,
            "Grant and donation funded, both published.",
            FundingOutcome::Disclosed,
        )
        .example(
            Rating::Partial,
            "Grants published, other backers unnamed.",
            FundingOutcome::PartiallyDisclosed,
        )
        .example(Rating::Fail, "No funding information.", FundingOutcome::Undisclosed)
}

// =========================================================================
// FEE TRANSPARENCY
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTransparencyOutcome {
    Itemized,
    TotalOnly,
    Hidden,
}

impl Outcome for FeeTransparencyOutcome {
    const ALL: &'static [Self] = &[
        FeeTransparencyOutcome::Itemized,
        FeeTransparencyOutcome::TotalOnly,
        FeeTransparencyOutcome::Hidden,
    ];

    fn id(self) -> &'static str {
        match self {
            FeeTransparencyOutcome::Itemized => "itemized",
            FeeTransparencyOutcome::TotalOnly => "total_only",
            FeeTransparencyOutcome::Hidden => "hidden",
        }
    }

    fn rating(self) -> Rating {
        match self {
            FeeTransparencyOutcome::Itemized => Rating::Pass,
            FeeTransparencyOutcome::TotalOnly => Rating::Partial,
            FeeTransparencyOutcome::Hidden => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            FeeTransparencyOutcome::Itemized => "Itemized fees",
            FeeTransparencyOutcome::TotalOnly => "Total fee only",
            FeeTransparencyOutcome::Hidden => "Fees hidden",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            FeeTransparencyOutcome::Itemized => {
                format!("{name} shows each fee component before you confirm.")
            }
            FeeTransparencyOutcome::TotalOnly => {
                format!("{name} shows the total fee but not what it is made of.")
            }
            FeeTransparencyOutcome::Hidden => {
                format!("{name} does not show fees before you confirm.")
            }
        }
    }
}

fn evaluate_fee_transparency(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(display) = ctx.features.fee_display else {
        return Ok(ctx.unrated("fee_display"));
    };

    let evaluation = match display {
        FeeDisplay::Itemized => ctx.evaluation(
            FeeTransparencyOutcome::Itemized,
            "Network and wallet fees are shown separately.",
        ),
        FeeDisplay::TotalOnly => ctx
            .evaluation(FeeTransparencyOutcome::TotalOnly, "A single total fee is shown.")
            .with_how_to_improve("Break the total down into network and wallet fees."),
        FeeDisplay::None => ctx
            .evaluation(FeeTransparencyOutcome::Hidden, "No fee is shown before signing.")
            .with_impact("Users may pay wallet fees they never agreed to.")
            .with_how_to_improve("Show fees before the user confirms."),
    };
    Ok(evaluation)
}

fn fee_transparency() -> Attribute {
    Attribute::new::<FeeTransparencyOutcome>(
        "fee_transparency",
        "Fee transparency",
        evaluate_fee_transparency,
    )
    .question("Does the wallet show what a transaction will cost?")
    .why_it_matters("Hidden wallet fees are a common and quiet way to charge users.")
    .methodology("Itemized fees pass; a total without a breakdown is partial.")
    .example(
        Rating::Pass,
        "Gas and swap fee shown separately.",
        FeeTransparencyOutcome::Itemized,
    )
    .example(
        Rating::Partial,
        "Single total shown.",
        FeeTransparencyOutcome::TotalOnly,
    )
    .example(Rating::Fail, "Fees not shown.", FeeTransparencyOutcome::Hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::test_support::{evaluate, outcome_of};
    use crate::declaration::WalletFeatures;
    use crate::feature::Feature;
    use crate::types::WalletProfile;

    fn with_source(license: License, visibility: SourceVisibility) -> WalletFeatures {
        WalletFeatures {
            license: Feature::uniform(license),
            source_visibility: Feature::uniform(visibility),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_source_outcomes() {
        let attribute = open_source();
        assert_eq!(
            outcome_of(&attribute, &with_source(License::Gpl3, SourceVisibility::Public)),
            "open_source"
        );
        assert_eq!(
            outcome_of(&attribute, &with_source(License::Busl, SourceVisibility::Public)),
            "source_available"
        );
        assert_eq!(
            outcome_of(
                &attribute,
                &with_source(License::Proprietary, SourceVisibility::Private)
            ),
            "proprietary"
        );
    }

    #[test]
    fn test_open_source_unrated_without_visibility() {
        let features = WalletFeatures {
            license: Feature::uniform(License::Mit),
            ..Default::default()
        };
        let evaluation = evaluate(&open_source(), WalletProfile::Generic, &features).unwrap();
        assert_eq!(evaluation.rating(), Rating::Unrated);
        assert!(evaluation.details.contains("source visibility"));
    }

    #[test]
    fn test_free_license_on_private_source_is_contradiction() {
        let features = with_source(License::Mit, SourceVisibility::Private);
        let result = evaluate(&open_source(), WalletProfile::Generic, &features);
        assert!(matches!(
            result,
            Err(RatingError::ContradictoryFacts {
                attribute: "open_source",
                ..
            })
        ));
    }

    #[test]
    fn test_source_visibility_names_repository() {
        let features = with_source(License::Mit, SourceVisibility::Public);
        let evaluation =
            evaluate(&source_visibility(), WalletProfile::Generic, &features).unwrap();
        assert_eq!(evaluation.value.id, "public");
        assert_eq!(evaluation.details, "Source is published.");
    }

    #[test]
    fn test_funding_disclosure() {
        let attribute = funding();
        let with = |sources: Vec<FundingSource>| WalletFeatures {
            funding: Feature::uniform(sources),
            ..Default::default()
        };
        assert_eq!(outcome_of(&attribute, &with(vec![])), "undisclosed");
        assert_eq!(
            outcome_of(&attribute, &with(vec![FundingSource::Undisclosed])),
            "undisclosed"
        );
        assert_eq!(
            outcome_of(
                &attribute,
                &with(vec![FundingSource::Grants, FundingSource::Undisclosed])
            ),
            "partially_disclosed"
        );
        assert_eq!(
            outcome_of(
                &attribute,
                &with(vec![FundingSource::Grants, FundingSource::Venture])
            ),
            "disclosed"
        );
    }

    #[test]
    fn test_fee_transparency_outcomes() {
        let attribute = fee_transparency();
        let with = |display| WalletFeatures {
            fee_display: Feature::uniform(display),
            ..Default::default()
        };
        assert_eq!(outcome_of(&attribute, &with(FeeDisplay::Itemized)), "itemized");
        assert_eq!(outcome_of(&attribute, &with(FeeDisplay::TotalOnly)), "total_only");
        assert_eq!(outcome_of(&attribute, &with(FeeDisplay::None)), "hidden");
    }
}
