//! Declaration parsing from YAML/JSON.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::facts::WalletFeatures;
use super::schema::validate_declaration_schema;
use crate::types::{Variant, WalletMetadata, WalletProfile};

/// Errors that can occur when loading declarations.
#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("Failed to read declaration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Declaration does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Declaration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// The complete static description of one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletDeclaration {
    pub metadata: WalletMetadata,

    #[serde(default)]
    pub profile: WalletProfile,

    /// Supported variants (must be non-empty)
    pub variants: BTreeSet<Variant>,

    #[serde(default)]
    pub features: WalletFeatures,
}

impl WalletDeclaration {
    /// Parse a declaration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DeclarationError> {
        let raw: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(raw)
    }

    /// Parse a declaration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, DeclarationError> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(raw)
    }

    /// Parse a declaration file, choosing the format by extension.
    ///
    /// `.json` files are read as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeclarationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn from_value(raw: serde_json::Value) -> Result<Self, DeclarationError> {
        validate_declaration_schema(&raw).map_err(DeclarationError::SchemaError)?;
        let declaration: WalletDeclaration = serde_json::from_value(raw)?;
        declaration.validate()?;
        Ok(declaration)
    }

    /// Validate the declaration beyond what the schema can express.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        if self.metadata.id.is_empty() {
            return Err(DeclarationError::MissingField("metadata.id".to_string()));
        }

        if self.metadata.display_name.is_empty() {
            return Err(DeclarationError::MissingField(
                "metadata.display_name".to_string(),
            ));
        }

        if self.variants.is_empty() {
            return Err(DeclarationError::ValidationError(format!(
                "wallet {} declares no supported variants",
                self.metadata.id
            )));
        }

        if let Some((feature, variant)) = self.unsupported_variant_key() {
            return Err(DeclarationError::ValidationError(format!(
                "feature {} declares variant {} which {} does not support",
                feature, variant, self.metadata.id
            )));
        }

        Ok(())
    }

    /// First per-variant feature key naming a variant outside `variants`.
    pub fn unsupported_variant_key(&self) -> Option<(&'static str, Variant)> {
        self.features
            .variant_keys()
            .into_iter()
            .find(|(_, variant)| !self.variants.contains(variant))
    }
}
