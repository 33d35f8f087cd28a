//! Wallet declarations.
//!
//! A declaration is the full, static set of facts about one wallet:
//! metadata, profile, supported variants and features. Declarations are
//! structured data validated against JSON Schema before typed parsing.

mod facts;
mod parser;
mod schema;

pub use facts::{
    AccountSupport, AddressPrivacy, AddressResolution, BrowserIntegration, BugBountyAvailability,
    BugBountyProgram, ChainConfigurability, ClearSigning, FeeDisplay, FlawSeverity,
    FundingSource, HardwareWalletVendor, LeakedData, License, MultiAddressHandling, PrivacyLeak,
    ResolvedFeatures, RpcEndpointConfiguration, ScamPrevention, SecurityAudit, SourceVisibility,
    UnpatchedFlaw, WalletFeatures,
};
pub use parser::{DeclarationError, WalletDeclaration};
pub use schema::validate_declaration_schema;
