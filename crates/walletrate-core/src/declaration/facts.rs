//! Typed facts a wallet declaration may carry.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::types::Variant;

/// Software license of the wallet's source code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum License {
    Mit,
    Apache2,
    Bsd3,
    Gpl3,
    Agpl3,
    Lgpl3,
    Mpl2,
    /// Business Source License and similar delayed-open licenses.
    Busl,
    Proprietary,
    Unlicensed,
}

impl License {
    /// Whether the license is a free and open source license.
    pub fn is_free(self) -> bool {
        matches!(
            self,
            License::Mit
                | License::Apache2
                | License::Bsd3
                | License::Gpl3
                | License::Agpl3
                | License::Lgpl3
                | License::Mpl2
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            License::Mit => "MIT",
            License::Apache2 => "Apache-2.0",
            License::Bsd3 => "BSD-3-Clause",
            License::Gpl3 => "GPL-3.0",
            License::Agpl3 => "AGPL-3.0",
            License::Lgpl3 => "LGPL-3.0",
            License::Mpl2 => "MPL-2.0",
            License::Busl => "BUSL-1.1",
            License::Proprietary => "proprietary",
            License::Unlicensed => "no license",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlawSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A flaw an audit reported that the wallet has not fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnpatchedFlaw {
    pub name: String,
    pub severity: FlawSeverity,
}

/// A third-party security audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecurityAudit {
    pub auditor: String,
    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,

    #[serde(default)]
    pub unpatched_flaws: Vec<UnpatchedFlaw>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HardwareWalletVendor {
    Ledger,
    Trezor,
    Keystone,
    GridPlus,
    Other,
}

/// How much of a transaction a connected hardware wallet displays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearSigning {
    Full,
    Partial,
    BlindOnly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BugBountyAvailability {
    Never,
    Inactive,
    Active,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BugBountyProgram {
    pub availability: BugBountyAvailability,

    /// Whether reporters are paid
    #[serde(default)]
    pub rewards: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScamPrevention {
    #[serde(default)]
    pub scam_url_warning: bool,
    #[serde(default)]
    pub contract_address_warning: bool,
    #[serde(default)]
    pub first_transfer_warning: bool,
}

impl ScamPrevention {
    pub fn warning_count(&self) -> usize {
        [
            self.scam_url_warning,
            self.contract_address_warning,
            self.first_transfer_warning,
        ]
        .into_iter()
        .filter(|w| *w)
        .count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeakedData {
    WalletAddress,
    IpAddress,
    Email,
}

/// A third party that receives user data during normal wallet use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivacyLeak {
    pub party: String,
    pub data: BTreeSet<LeakedData>,
}

impl PrivacyLeak {
    fn receives(&self, data: LeakedData) -> bool {
        self.data.contains(&data)
    }

    /// Whether this party can tie an address to the user's network identity.
    pub fn correlates_address(&self) -> bool {
        self.receives(LeakedData::WalletAddress)
            && (self.receives(LeakedData::IpAddress) || self.receives(LeakedData::Email))
    }

    pub fn sees_address(&self) -> bool {
        self.receives(LeakedData::WalletAddress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AddressPrivacy {
    #[serde(default)]
    pub leaks: Vec<PrivacyLeak>,
}

/// How the wallet queries data for several addresses of one user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MultiAddressHandling {
    /// All addresses in a single request
    Batched,
    /// One request per address over the same connection
    Separate,
    /// One request per address over isolated connections or proxies
    Isolated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RpcEndpointConfiguration {
    Never,
    /// Only after defaults have already been contacted
    AfterOnboarding,
    DuringOnboarding,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfigurability {
    pub l1_rpc_endpoint: RpcEndpointConfiguration,

    #[serde(default)]
    pub custom_chains: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    Grants,
    Donations,
    Venture,
    Token,
    FeeRevenue,
    Undisclosed,
}

impl FundingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FundingSource::Grants => "grants",
            FundingSource::Donations => "donations",
            FundingSource::Venture => "venture capital",
            FundingSource::Token => "token sales",
            FundingSource::FeeRevenue => "fee revenue",
            FundingSource::Undisclosed => "undisclosed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeeDisplay {
    None,
    TotalOnly,
    Itemized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BrowserIntegration {
    #[serde(default)]
    pub eip1193: bool,
    #[serde(default)]
    pub eip6963: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AddressResolution {
    #[serde(default)]
    pub ens: bool,
    #[serde(default)]
    pub chain_specific_addresses: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccountSupport {
    #[serde(default)]
    pub eoa: bool,
    #[serde(default)]
    pub erc4337: bool,
    #[serde(default)]
    pub eip7702: bool,
}

/// Every fact a wallet declares. Missing keys are undetermined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct WalletFeatures {
    #[serde(default)]
    pub license: Feature<License>,
    #[serde(default)]
    pub source_visibility: Feature<SourceVisibility>,
    #[serde(default)]
    pub security_audits: Feature<Vec<SecurityAudit>>,
    #[serde(default)]
    pub hardware_wallet_support: Feature<BTreeSet<HardwareWalletVendor>>,
    #[serde(default)]
    pub hardware_wallet_clear_signing: Feature<ClearSigning>,
    #[serde(default)]
    pub bug_bounty_program: Feature<BugBountyProgram>,
    #[serde(default)]
    pub scam_prevention: Feature<ScamPrevention>,
    #[serde(default)]
    pub address_privacy: Feature<AddressPrivacy>,
    #[serde(default)]
    pub multi_address: Feature<MultiAddressHandling>,
    #[serde(default)]
    pub chain_configurability: Feature<ChainConfigurability>,
    #[serde(default)]
    pub funding: Feature<Vec<FundingSource>>,
    #[serde(default)]
    pub fee_display: Feature<FeeDisplay>,
    #[serde(default)]
    pub browser_integration: Feature<BrowserIntegration>,
    #[serde(default)]
    pub address_resolution: Feature<AddressResolution>,
    #[serde(default)]
    pub account_support: Feature<AccountSupport>,
}

impl WalletFeatures {
    /// Resolve every feature for one variant.
    pub fn resolve(&self, variant: Variant) -> ResolvedFeatures<'_> {
        ResolvedFeatures {
            license: self.license.resolve(variant),
            source_visibility: self.source_visibility.resolve(variant),
            security_audits: self.security_audits.resolve(variant),
            hardware_wallet_support: self.hardware_wallet_support.resolve(variant),
            hardware_wallet_clear_signing: self.hardware_wallet_clear_signing.resolve(variant),
            bug_bounty_program: self.bug_bounty_program.resolve(variant),
            scam_prevention: self.scam_prevention.resolve(variant),
            address_privacy: self.address_privacy.resolve(variant),
            multi_address: self.multi_address.resolve(variant),
            chain_configurability: self.chain_configurability.resolve(variant),
            funding: self.funding.resolve(variant),
            fee_display: self.fee_display.resolve(variant),
            browser_integration: self.browser_integration.resolve(variant),
            address_resolution: self.address_resolution.resolve(variant),
            account_support: self.account_support.resolve(variant),
        }
    }

    /// `(feature name, variant)` for every per-variant key in the declaration.
    pub fn variant_keys(&self) -> Vec<(&'static str, Variant)> {
        let per_feature = [
            ("license", self.license.declared_variants()),
            ("source_visibility", self.source_visibility.declared_variants()),
            ("security_audits", self.security_audits.declared_variants()),
            (
                "hardware_wallet_support",
                self.hardware_wallet_support.declared_variants(),
            ),
            (
                "hardware_wallet_clear_signing",
                self.hardware_wallet_clear_signing.declared_variants(),
            ),
            ("bug_bounty_program", self.bug_bounty_program.declared_variants()),
            ("scam_prevention", self.scam_prevention.declared_variants()),
            ("address_privacy", self.address_privacy.declared_variants()),
            ("multi_address", self.multi_address.declared_variants()),
            (
                "chain_configurability",
                self.chain_configurability.declared_variants(),
            ),
            ("funding", self.funding.declared_variants()),
            ("fee_display", self.fee_display.declared_variants()),
            ("browser_integration", self.browser_integration.declared_variants()),
            ("address_resolution", self.address_resolution.declared_variants()),
            ("account_support", self.account_support.declared_variants()),
        ];

        per_feature
            .into_iter()
            .flat_map(|(name, variants)| variants.into_iter().map(move |v| (name, v)))
            .collect()
    }
}

/// Facts resolved for a single variant; `None` is undetermined.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedFeatures<'a> {
    pub license: Option<&'a License>,
    pub source_visibility: Option<&'a SourceVisibility>,
    pub security_audits: Option<&'a Vec<SecurityAudit>>,
    pub hardware_wallet_support: Option<&'a BTreeSet<HardwareWalletVendor>>,
    pub hardware_wallet_clear_signing: Option<&'a ClearSigning>,
    pub bug_bounty_program: Option<&'a BugBountyProgram>,
    pub scam_prevention: Option<&'a ScamPrevention>,
    pub address_privacy: Option<&'a AddressPrivacy>,
    pub multi_address: Option<&'a MultiAddressHandling>,
    pub chain_configurability: Option<&'a ChainConfigurability>,
    pub funding: Option<&'a Vec<FundingSource>>,
    pub fee_display: Option<&'a FeeDisplay>,
    pub browser_integration: Option<&'a BrowserIntegration>,
    pub address_resolution: Option<&'a AddressResolution>,
    pub account_support: Option<&'a AccountSupport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_freedom() {
        assert!(License::Mit.is_free());
        assert!(License::Gpl3.is_free());
        assert!(!License::Busl.is_free());
        assert!(!License::Proprietary.is_free());
    }

    #[test]
    fn test_leak_correlation_requires_identity() {
        let address_only = PrivacyLeak {
            party: "Indexer".to_string(),
            data: [LeakedData::WalletAddress].into_iter().collect(),
        };
        let with_ip = PrivacyLeak {
            party: "RPC".to_string(),
            data: [LeakedData::WalletAddress, LeakedData::IpAddress]
                .into_iter()
                .collect(),
        };
        assert!(!address_only.correlates_address());
        assert!(address_only.sees_address());
        assert!(with_ip.correlates_address());
    }

    #[test]
    fn test_variant_keys_lists_per_variant_features() {
        let features = WalletFeatures {
            license: Feature::uniform(License::Mit),
            fee_display: Feature::per_variant([
                (Variant::Mobile, FeeDisplay::TotalOnly),
                (Variant::Browser, FeeDisplay::Itemized),
            ]),
            ..Default::default()
        };
        assert_eq!(
            features.variant_keys(),
            vec![("fee_display", Variant::Mobile), ("fee_display", Variant::Browser)]
        );
    }

    #[test]
    fn test_resolve_per_variant() {
        let features = WalletFeatures {
            multi_address: Feature::per_variant([(Variant::Desktop, MultiAddressHandling::Isolated)]),
            ..Default::default()
        };
        assert_eq!(
            features.resolve(Variant::Desktop).multi_address,
            Some(&MultiAddressHandling::Isolated)
        );
        assert!(features.resolve(Variant::Mobile).multi_address.is_none());
        assert!(features.resolve(Variant::Mobile).license.is_none());
    }
}
