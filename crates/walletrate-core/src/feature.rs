//! Variant-aware facts.
//!
//! A feature is declared either once for the whole wallet or per variant.
//! `null` (or a missing key) means the fact has not been determined yet.
//!
//! ```yaml
//! license: mit                  # uniform
//! browser_integration:          # per variant
//!   browser: { eip1193: true, eip6963: true }
//!   mobile: null
//! ```
//!
//! A mapping is read as per-variant only when every key names a variant.
//! A mapping mixing variant keys with other keys is rejected.

use serde::de::{DeserializeOwned, Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Variant, VariantMap};

/// Errors from reading a feature's declared shape.
#[derive(Error, Debug)]
pub enum FeatureShapeError {
    #[error("mapping mixes variant keys ({variants}) with other keys ({others})")]
    MixedKeys { variants: String, others: String },

    #[error("invalid value for variant {variant}: {source}")]
    VariantValue {
        variant: Variant,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value: {0}")]
    Value(#[from] serde_json::Error),
}

/// A raw fact about a wallet.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature<T> {
    /// Not yet determined.
    Unknown,

    /// Same for every variant.
    Uniform(T),

    /// Declared per variant; `None` entries are undetermined for that variant.
    PerVariant(VariantMap<Option<T>>),
}

impl<T> Default for Feature<T> {
    fn default() -> Self {
        Feature::Unknown
    }
}

impl<T> Feature<T> {
    pub fn uniform(value: T) -> Self {
        Feature::Uniform(value)
    }

    pub fn per_variant(entries: impl IntoIterator<Item = (Variant, T)>) -> Self {
        Feature::PerVariant(entries.into_iter().map(|(v, t)| (v, Some(t))).collect())
    }

    /// Resolve to the concrete value for one variant.
    ///
    /// A per-variant feature without an entry for `variant` resolves to
    /// `None` rather than failing.
    pub fn resolve(&self, variant: Variant) -> Option<&T> {
        match self {
            Feature::Unknown => None,
            Feature::Uniform(value) => Some(value),
            Feature::PerVariant(entries) => entries.get(&variant).and_then(Option::as_ref),
        }
    }

    /// Variants explicitly keyed by a per-variant declaration.
    pub fn declared_variants(&self) -> Vec<Variant> {
        match self {
            Feature::PerVariant(entries) => entries.keys().copied().collect(),
            Feature::Unknown | Feature::Uniform(_) => Vec::new(),
        }
    }
}

impl<T: DeserializeOwned> Feature<T> {
    /// Interpret an untyped value as a feature declaration.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, FeatureShapeError> {
        match raw {
            serde_json::Value::Null => Ok(Feature::Unknown),
            serde_json::Value::Object(map) if !map.is_empty() => {
                let mut keyed = Vec::new();
                let mut others = serde_json::Map::new();
                for (key, value) in map {
                    match key.parse::<Variant>() {
                        Ok(variant) => keyed.push((variant, value)),
                        Err(_) => {
                            others.insert(key, value);
                        }
                    }
                }

                if others.is_empty() {
                    let mut entries = VariantMap::new();
                    for (variant, value) in keyed {
                        let resolved = if value.is_null() {
                            None
                        } else {
                            Some(serde_json::from_value(value).map_err(|source| {
                                FeatureShapeError::VariantValue { variant, source }
                            })?)
                        };
                        entries.insert(variant, resolved);
                    }
                    Ok(Feature::PerVariant(entries))
                } else if keyed.is_empty() {
                    let value = serde_json::Value::Object(others);
                    Ok(Feature::Uniform(serde_json::from_value(value)?))
                } else {
                    Err(FeatureShapeError::MixedKeys {
                        variants: keyed
                            .iter()
                            .map(|(v, _)| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        others: others.keys().map(String::as_str).collect::<Vec<_>>().join(", "),
                    })
                }
            }
            other => Ok(Feature::Uniform(serde_json::from_value(other)?)),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Feature<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Feature::from_json(raw).map_err(D::Error::custom)
    }
}

impl<T: Serialize> Serialize for Feature<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Feature::Unknown => serializer.serialize_none(),
            Feature::Uniform(value) => value.serialize(serializer),
            Feature::PerVariant(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (variant, value) in entries {
                    map.serialize_entry(variant.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}
