//! Security attributes.
//!
//! **Question**: Can the wallet be trusted to protect funds from flaws,
//! compromised devices and scams?

use crate::aggregator::pick_worst;
use crate::declaration::{
    BugBountyAvailability, ClearSigning, FlawSeverity, SecurityAudit, UnpatchedFlaw,
};
use crate::types::{Evaluation, Rating, ValueData, VariantMap, WalletMetadata};
use crate::RatingError;

use super::{Attribute, AttributeGroup, EvaluationContext, Outcome};

pub(crate) fn group() -> AttributeGroup {
    AttributeGroup::new(
        "security",
        "Security",
        [
            (security_audits(), 2.0),
            (hardware_wallet_support(), 1.0),
            (hardware_wallet_clear_signing(), 1.0),
            (bug_bounty_program(), 1.0),
            (scam_prevention(), 1.0),
        ],
    )
}

// =========================================================================
// SECURITY AUDITS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Audited,
    MinorFlawsUnpatched,
    SevereFlawsUnpatched,
    NoAudits,
}

impl Outcome for AuditOutcome {
    const ALL: &'static [Self] = &[
        AuditOutcome::Audited,
        AuditOutcome::MinorFlawsUnpatched,
        AuditOutcome::SevereFlawsUnpatched,
        AuditOutcome::NoAudits,
    ];

    fn id(self) -> &'static str {
        match self {
            AuditOutcome::Audited => "audited",
            AuditOutcome::MinorFlawsUnpatched => "minor_flaws_unpatched",
            AuditOutcome::SevereFlawsUnpatched => "severe_flaws_unpatched",
            AuditOutcome::NoAudits => "no_audits",
        }
    }

    fn rating(self) -> Rating {
        match self {
            AuditOutcome::Audited => Rating::Pass,
            AuditOutcome::MinorFlawsUnpatched => Rating::Partial,
            AuditOutcome::SevereFlawsUnpatched | AuditOutcome::NoAudits => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            AuditOutcome::Audited => "Audited",
            AuditOutcome::MinorFlawsUnpatched => "Minor flaws unpatched",
            AuditOutcome::SevereFlawsUnpatched => "Severe flaws unpatched",
            AuditOutcome::NoAudits => "Not audited",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            AuditOutcome::Audited => {
                format!("{name} has been audited and has addressed every reported flaw.")
            }
            AuditOutcome::MinorFlawsUnpatched => {
                format!("{name} has been audited but some low-severity flaws remain unpatched.")
            }
            AuditOutcome::SevereFlawsUnpatched => {
                format!("{name} has been audited but high-severity flaws remain unpatched.")
            }
            AuditOutcome::NoAudits => format!("{name} has not had a third-party security audit."),
        }
    }
}

fn evaluate_security_audits(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(audits) = ctx.features.security_audits else {
        return Ok(ctx.unrated("security_audits"));
    };

    if audits.is_empty() {
        return Ok(ctx
            .evaluation(
                AuditOutcome::NoAudits,
                format!("No audits of {} are on record.", ctx.wallet.display_name),
            )
            .with_impact("Bugs in the wallet's code may go unnoticed until they are exploited.")
            .with_how_to_improve("Commission an audit from a reputable security firm."));
    }

    let unpatched: Vec<&UnpatchedFlaw> = audits.iter().flat_map(|a| &a.unpatched_flaws).collect();
    let severe = unpatched
        .iter()
        .filter(|f| f.severity >= FlawSeverity::High)
        .count();

    let outcome = if severe > 0 {
        AuditOutcome::SevereFlawsUnpatched
    } else if !unpatched.is_empty() {
        AuditOutcome::MinorFlawsUnpatched
    } else {
        AuditOutcome::Audited
    };

    let latest = audits
        .iter()
        .max_by_key(|a| a.date)
        .map(|a| format!(" Most recent: {} on {}.", a.auditor, a.date))
        .unwrap_or_default();
    let details = format!(
        "{} audit(s) on record with {} unpatched flaw(s), {} of them high severity or worse.{}",
        audits.len(),
        unpatched.len(),
        severe,
        latest
    );

    let mut evaluation = ctx.evaluation(outcome, details);
    evaluation.value = evaluation
        .value
        .with_data(ValueData::Audits(sorted_audits(audits.iter().cloned())));
    if outcome != AuditOutcome::Audited {
        evaluation = evaluation.with_how_to_improve("Patch the flaws reported by auditors.");
    }
    Ok(evaluation)
}

/// Newest first, duplicates removed.
fn sorted_audits(audits: impl IntoIterator<Item = SecurityAudit>) -> Vec<SecurityAudit> {
    let mut audits: Vec<SecurityAudit> = audits.into_iter().collect();
    audits.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.cmp(b)));
    audits.dedup();
    audits
}

/// Worst-of merge that also carries every variant's audit records.
fn aggregate_security_audits(evaluations: &VariantMap<Evaluation>) -> Option<Evaluation> {
    let mut worst = pick_worst(evaluations)?;

    let all = evaluations
        .values()
        .filter_map(|e| match &e.value.data {
            Some(ValueData::Audits(audits)) => Some(audits.iter().cloned()),
            None => None,
        })
        .flatten();
    let audits = sorted_audits(all);

    if !audits.is_empty() {
        worst.value.data = Some(ValueData::Audits(audits));
    }
    Some(worst)
}

fn security_audits() -> Attribute {
    Attribute::new::<AuditOutcome>("security_audits", "Security audits", evaluate_security_audits)
        .question("Has the wallet been audited, and were the findings fixed?")
        .why_it_matters(
            "Audits by independent firms catch flaws that the wallet's own developers miss.",
        )
        .methodology(
            "Rated on every audit on record. Any unpatched high or critical flaw fails; \
             unpatched low or medium flaws are partial.",
        )
        .aggregate_with(aggregate_security_audits)
        .example(Rating::Pass, "Audited with every flaw patched.", AuditOutcome::Audited)
        .example(
            Rating::Partial,
            "Audited, with a low-severity flaw still open.",
            AuditOutcome::MinorFlawsUnpatched,
        )
        .example(
            Rating::Fail,
            "Audited, with a critical flaw still open.",
            AuditOutcome::SevereFlawsUnpatched,
        )
        .example(Rating::Fail, "Never audited.", AuditOutcome::NoAudits)
}

// =========================================================================
// HARDWARE WALLET SUPPORT
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareSupportOutcome {
    MultipleVendors,
    SingleVendor,
    NoSupport,
}

impl Outcome for HardwareSupportOutcome {
    const ALL: &'static [Self] = &[
        HardwareSupportOutcome::MultipleVendors,
        HardwareSupportOutcome::SingleVendor,
        HardwareSupportOutcome::NoSupport,
    ];

    fn id(self) -> &'static str {
        match self {
            HardwareSupportOutcome::MultipleVendors => "multiple_vendors",
            HardwareSupportOutcome::SingleVendor => "single_vendor",
            HardwareSupportOutcome::NoSupport => "no_support",
        }
    }

    fn rating(self) -> Rating {
        match self {
            HardwareSupportOutcome::MultipleVendors => Rating::Pass,
            HardwareSupportOutcome::SingleVendor => Rating::Partial,
            HardwareSupportOutcome::NoSupport => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            HardwareSupportOutcome::MultipleVendors => "Supports hardware wallets",
            HardwareSupportOutcome::SingleVendor => "Supports one hardware wallet",
            HardwareSupportOutcome::NoSupport => "No hardware wallet support",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            HardwareSupportOutcome::MultipleVendors => {
                format!("{name} lets you keep keys on hardware wallets from several vendors.")
            }
            HardwareSupportOutcome::SingleVendor => {
                format!("{name} supports hardware wallets from a single vendor only.")
            }
            HardwareSupportOutcome::NoSupport => {
                format!("{name} cannot be used with a hardware wallet.")
            }
        }
    }
}

fn evaluate_hardware_wallet_support(
    ctx: &EvaluationContext<'_>,
) -> Result<Evaluation, RatingError> {
    let Some(vendors) = ctx.features.hardware_wallet_support else {
        return Ok(ctx.unrated("hardware_wallet_support"));
    };

    let listed = vendors
        .iter()
        .map(|v| format!("{:?}", v))
        .collect::<Vec<_>>()
        .join(", ");

    let evaluation = match vendors.len() {
        0 => ctx
            .evaluation(
                HardwareSupportOutcome::NoSupport,
                "No hardware wallet vendor is supported.",
            )
            .with_impact("Keys live on a general-purpose device exposed to malware.")
            .with_how_to_improve("Add support for at least two hardware wallet vendors."),
        1 => ctx
            .evaluation(
                HardwareSupportOutcome::SingleVendor,
                format!("Supported vendor: {listed}."),
            )
            .with_how_to_improve("Support hardware wallets from more than one vendor."),
        _ => ctx.evaluation(
            HardwareSupportOutcome::MultipleVendors,
            format!("Supported vendors: {listed}."),
        ),
    };
    Ok(evaluation)
}

fn hardware_wallet_support() -> Attribute {
    Attribute::new::<HardwareSupportOutcome>(
        "hardware_wallet_support",
        "Hardware wallet support",
        evaluate_hardware_wallet_support,
    )
    .question("Can keys be held on a dedicated hardware wallet?")
    .why_it_matters("Hardware wallets keep keys off devices that run arbitrary software.")
    .methodology("Counts supported hardware wallet vendors: two or more pass, one is partial.")
    .example(
        Rating::Pass,
        "Works with Ledger and Trezor devices.",
        HardwareSupportOutcome::MultipleVendors,
    )
    .example(
        Rating::Partial,
        "Works with Ledger devices only.",
        HardwareSupportOutcome::SingleVendor,
    )
    .example(
        Rating::Fail,
        "Software keys only.",
        HardwareSupportOutcome::NoSupport,
    )
}

// =========================================================================
// HARDWARE WALLET CLEAR SIGNING
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearSigningOutcome {
    FullClearSigning,
    PartialClearSigning,
    BlindSigning,
    NoHardwareWallets,
}

impl Outcome for ClearSigningOutcome {
    const ALL: &'static [Self] = &[
        ClearSigningOutcome::FullClearSigning,
        ClearSigningOutcome::PartialClearSigning,
        ClearSigningOutcome::BlindSigning,
        ClearSigningOutcome::NoHardwareWallets,
    ];

    fn id(self) -> &'static str {
        match self {
            ClearSigningOutcome::FullClearSigning => "full_clear_signing",
            ClearSigningOutcome::PartialClearSigning => "partial_clear_signing",
            ClearSigningOutcome::BlindSigning => "blind_signing",
            ClearSigningOutcome::NoHardwareWallets => "no_hardware_wallets",
        }
    }

    fn rating(self) -> Rating {
        match self {
            ClearSigningOutcome::FullClearSigning => Rating::Pass,
            ClearSigningOutcome::PartialClearSigning => Rating::Partial,
            ClearSigningOutcome::BlindSigning | ClearSigningOutcome::NoHardwareWallets => {
                Rating::Fail
            }
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            ClearSigningOutcome::FullClearSigning => "Full clear signing",
            ClearSigningOutcome::PartialClearSigning => "Partial clear signing",
            ClearSigningOutcome::BlindSigning => "Blind signing",
            ClearSigningOutcome::NoHardwareWallets => "No hardware wallets",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            ClearSigningOutcome::FullClearSigning => {
                format!("{name} shows full transaction details on the hardware wallet screen.")
            }
            ClearSigningOutcome::PartialClearSigning => {
                format!("{name} shows some transaction details on the hardware wallet screen.")
            }
            ClearSigningOutcome::BlindSigning => {
                format!("{name} asks hardware wallets to sign data they cannot display.")
            }
            ClearSigningOutcome::NoHardwareWallets => {
                format!("{name} does not support hardware wallets, so nothing is clear signed.")
            }
        }
    }
}

fn evaluate_hardware_wallet_clear_signing(
    ctx: &EvaluationContext<'_>,
) -> Result<Evaluation, RatingError> {
    let Some(vendors) = ctx.features.hardware_wallet_support else {
        return Ok(ctx.unrated("hardware_wallet_support"));
    };

    if vendors.is_empty() {
        return match ctx.features.hardware_wallet_clear_signing {
            Some(ClearSigning::Full) | Some(ClearSigning::Partial) => Err(ctx.contradiction(
                "hardware_wallet_clear_signing",
                "clear signing declared without any supported hardware wallet",
            )),
            Some(ClearSigning::BlindOnly) | None => Ok(ctx
                .evaluation(
                    ClearSigningOutcome::NoHardwareWallets,
                    "No hardware wallet is supported.",
                )
                .with_how_to_improve("Support hardware wallets with clear signing.")),
        };
    }

    let Some(clear_signing) = ctx.features.hardware_wallet_clear_signing else {
        return Ok(ctx.unrated("hardware_wallet_clear_signing"));
    };

    let evaluation = match clear_signing {
        ClearSigning::Full => ctx.evaluation(
            ClearSigningOutcome::FullClearSigning,
            "Every transaction field is displayed on the device.",
        ),
        ClearSigning::Partial => ctx
            .evaluation(
                ClearSigningOutcome::PartialClearSigning,
                "Some transaction types are displayed on the device.",
            )
            .with_how_to_improve("Clear sign every transaction type, including typed data."),
        ClearSigning::BlindOnly => ctx
            .evaluation(
                ClearSigningOutcome::BlindSigning,
                "Transactions are signed as opaque hashes.",
            )
            .with_impact("A compromised host can make the device sign anything.")
            .with_how_to_improve("Send full transaction data to the device for display."),
    };
    Ok(evaluation)
}

fn hardware_wallet_clear_signing() -> Attribute {
    Attribute::new::<ClearSigningOutcome>(
        "hardware_wallet_clear_signing",
        "Hardware wallet clear signing",
        evaluate_hardware_wallet_clear_signing,
    )
    .question("Does the hardware wallet show what it is signing?")
    .why_it_matters("A device that signs blindly cannot protect against a compromised host.")
    .methodology(
        "Rated on the most complete clear signing mode the wallet uses with supported devices.",
    )
    .example(
        Rating::Pass,
        "All fields shown on device.",
        ClearSigningOutcome::FullClearSigning,
    )
    .example(
        Rating::Partial,
        "Transfers shown, typed data blind signed.",
        ClearSigningOutcome::PartialClearSigning,
    )
    .example(Rating::Fail, "Hash-only signing.", ClearSigningOutcome::BlindSigning)
    .example(
        Rating::Fail,
        "No hardware wallet support.",
        ClearSigningOutcome::NoHardwareWallets,
    )
}

// =========================================================================
// BUG BOUNTY PROGRAM
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugBountyOutcome {
    Rewarded,
    DisclosureOnly,
    Inactive,
    NoProgram,
}

impl Outcome for BugBountyOutcome {
    const ALL: &'static [Self] = &[
        BugBountyOutcome::Rewarded,
        BugBountyOutcome::DisclosureOnly,
        BugBountyOutcome::Inactive,
        BugBountyOutcome::NoProgram,
    ];

    fn id(self) -> &'static str {
        match self {
            BugBountyOutcome::Rewarded => "rewarded",
            BugBountyOutcome::DisclosureOnly => "disclosure_only",
            BugBountyOutcome::Inactive => "inactive",
            BugBountyOutcome::NoProgram => "no_program",
        }
    }

    fn rating(self) -> Rating {
        match self {
            BugBountyOutcome::Rewarded => Rating::Pass,
            BugBountyOutcome::DisclosureOnly | BugBountyOutcome::Inactive => Rating::Partial,
            BugBountyOutcome::NoProgram => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            BugBountyOutcome::Rewarded => "Rewarded bug bounty",
            BugBountyOutcome::DisclosureOnly => "Disclosure policy only",
            BugBountyOutcome::Inactive => "Inactive bug bounty",
            BugBountyOutcome::NoProgram => "No bug bounty",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            BugBountyOutcome::Rewarded => {
                format!("{name} runs an active bug bounty that pays researchers.")
            }
            BugBountyOutcome::DisclosureOnly => {
                format!("{name} accepts vulnerability reports but does not pay for them.")
            }
            BugBountyOutcome::Inactive => format!("{name} had a bug bounty that is no longer active."),
            BugBountyOutcome::NoProgram => format!("{name} has no bug bounty program."),
        }
    }

    fn score(self) -> Option<f64> {
        match self {
            BugBountyOutcome::Inactive => Some(0.25),
            _ => None,
        }
    }
}

fn evaluate_bug_bounty_program(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(program) = ctx.features.bug_bounty_program else {
        return Ok(ctx.unrated("bug_bounty_program"));
    };

    let evaluation = match (program.availability, program.rewards) {
        (BugBountyAvailability::Active, true) => ctx.evaluation(
            BugBountyOutcome::Rewarded,
            "An active program pays for reported vulnerabilities.",
        ),
        (BugBountyAvailability::Active, false) => ctx
            .evaluation(
                BugBountyOutcome::DisclosureOnly,
                "Reports are accepted without rewards.",
            )
            .with_how_to_improve("Offer rewards for responsibly disclosed vulnerabilities."),
        (BugBountyAvailability::Inactive, _) => ctx
            .evaluation(BugBountyOutcome::Inactive, "The program has been discontinued.")
            .with_how_to_improve("Reopen the bug bounty program."),
        (BugBountyAvailability::Never, true) => {
            return Err(ctx.contradiction(
                "bug_bounty_program",
                "rewards declared for a program that never existed",
            ))
        }
        (BugBountyAvailability::Never, false) => ctx
            .evaluation(BugBountyOutcome::NoProgram, "No program has ever been run.")
            .with_impact("Researchers who find flaws have no incentive to report them.")
            .with_how_to_improve("Launch a bug bounty program."),
    };
    Ok(evaluation)
}

fn bug_bounty_program() -> Attribute {
    Attribute::new::<BugBountyOutcome>(
        "bug_bounty_program",
        "Bug bounty program",
        evaluate_bug_bounty_program,
    )
    .question("Are researchers rewarded for reporting vulnerabilities?")
    .why_it_matters("Paid bounties turn would-be attackers into reporters.")
    .methodology(
        "An active program with rewards passes. Disclosure-only or discontinued programs are \
         partial; a discontinued program scores lower.",
    )
    .example(Rating::Pass, "Active program with payouts.", BugBountyOutcome::Rewarded)
    .example(
        Rating::Partial,
        "security.txt with no payouts.",
        BugBountyOutcome::DisclosureOnly,
    )
    .example(Rating::Partial, "Program closed last year.", BugBountyOutcome::Inactive)
    .example(Rating::Fail, "No program.", BugBountyOutcome::NoProgram)
}

// =========================================================================
// SCAM PREVENTION
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScamPreventionOutcome {
    Comprehensive,
    SomeWarnings,
    NoWarnings,
}

impl Outcome for ScamPreventionOutcome {
    const ALL: &'static [Self] = &[
        ScamPreventionOutcome::Comprehensive,
        ScamPreventionOutcome::SomeWarnings,
        ScamPreventionOutcome::NoWarnings,
    ];

    fn id(self) -> &'static str {
        match self {
            ScamPreventionOutcome::Comprehensive => "comprehensive",
            ScamPreventionOutcome::SomeWarnings => "some_warnings",
            ScamPreventionOutcome::NoWarnings => "no_warnings",
        }
    }

    fn rating(self) -> Rating {
        match self {
            ScamPreventionOutcome::Comprehensive => Rating::Pass,
            ScamPreventionOutcome::SomeWarnings => Rating::Partial,
            ScamPreventionOutcome::NoWarnings => Rating::Fail,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            ScamPreventionOutcome::Comprehensive => "Scam warnings",
            ScamPreventionOutcome::SomeWarnings => "Some scam warnings",
            ScamPreventionOutcome::NoWarnings => "No scam warnings",
        }
    }

    fn explanation(self, wallet: &WalletMetadata) -> String {
        let name = &wallet.display_name;
        match self {
            ScamPreventionOutcome::Comprehensive => {
                format!("{name} warns about scam sites, suspicious contracts and first transfers.")
            }
            ScamPreventionOutcome::SomeWarnings => format!("{name} warns about some common scams."),
            ScamPreventionOutcome::NoWarnings => format!("{name} does not warn about common scams."),
        }
    }
}

fn evaluate_scam_prevention(ctx: &EvaluationContext<'_>) -> Result<Evaluation, RatingError> {
    let Some(prevention) = ctx.features.scam_prevention else {
        return Ok(ctx.unrated("scam_prevention"));
    };

    let count = prevention.warning_count();
    let details = format!("{count} of 3 scam warnings are implemented.");
    let evaluation = match count {
        3 => ctx.evaluation(ScamPreventionOutcome::Comprehensive, details),
        0 => ctx
            .evaluation(ScamPreventionOutcome::NoWarnings, details)
            .with_impact("Users get no warning before interacting with known scams.")
            .with_how_to_improve("Warn on known scam URLs, contracts and first-time recipients."),
        _ => ctx
            .evaluation(ScamPreventionOutcome::SomeWarnings, details)
            .with_how_to_improve("Implement the remaining scam warnings."),
    };
    Ok(evaluation)
}

fn scam_prevention() -> Attribute {
    Attribute::new::<ScamPreventionOutcome>(
        "scam_prevention",
        "Scam prevention",
        evaluate_scam_prevention,
    )
    .question("Does the wallet warn before users interact with likely scams?")
    .why_it_matters("Most lost funds are lost to phishing, not to cryptography failures.")
    .methodology(
        "Checks for scam URL warnings, suspicious contract warnings and first-transfer \
         warnings. All three pass; one or two are partial.",
    )
    .example(
        Rating::Pass,
        "All three warnings.",
        ScamPreventionOutcome::Comprehensive,
    )
    .example(Rating::Partial, "Scam URL warnings only.", ScamPreventionOutcome::SomeWarnings)
    .example(Rating::Fail, "No warnings.", ScamPreventionOutcome::NoWarnings)
}
