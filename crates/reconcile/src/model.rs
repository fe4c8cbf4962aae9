//! Value types shared by drafts, resources and update actions

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Keys accepted by the platform for resources, variants and assets
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{2,256}$").expect("key pattern is valid"));

/// Check that a business key has the format the platform accepts.
///
/// Keys are 2 to 256 ASCII letters, digits, `_` or `-`. One-character and
/// non-ASCII keys are refused before any catalog call. Matching against
/// existing resources is exact string equality.
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::MissingKey);
    }
    if !KEY_PATTERN.is_match(key) {
        return Err(ValidationError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A text value translated into several locales
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(pub BTreeMap<String, String>);

impl LocalizedString {
    /// Create a value with a single locale
    pub fn of(locale: &str, value: &str) -> Self {
        Self::default().with(locale, value)
    }

    /// Add or replace one locale
    pub fn with(mut self, locale: &str, value: &str) -> Self {
        self.0.insert(locale.to_string(), value.to_string());
        self
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `desired` over `self`.
    ///
    /// Locales only present in `self` survive unless `remove_others` is set.
    pub fn merged_with(&self, desired: &Self, remove_others: bool) -> Self {
        if remove_others {
            return desired.clone();
        }
        let mut merged = self.0.clone();
        merged.extend(desired.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }
}

/// Monetary amount in the smallest currency unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency_code: String,
    pub cent_amount: i64,
}

impl Money {
    pub fn new(currency_code: &str, cent_amount: i64) -> Self {
        Self {
            currency_code: currency_code.to_string(),
            cent_amount,
        }
    }
}

/// Custom fields as submitted in a draft; the type is referenced by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldsDraft {
    pub type_key: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl CustomFieldsDraft {
    pub fn new(type_key: &str) -> Self {
        Self {
            type_key: type_key.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }
}

/// Custom fields as stored on the platform; the type is referenced by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFields {
    pub type_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// A named attribute value on a product variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// `null` or missing unsets the attribute
    #[serde(default)]
    pub value: Value,
}

impl Attribute {
    pub fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub w: u32,
    pub h: u32,
}

/// An externally hosted image, identified by its url
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
}

impl Image {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            label: None,
            dimensions: None,
        }
    }
}

/// One downloadable representation of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Asset as submitted in a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDraft {
    pub key: String,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub sources: Vec<AssetSource>,
    #[serde(default)]
    pub custom: Option<CustomFieldsDraft>,
}

impl AssetDraft {
    pub fn new(key: &str, name: LocalizedString) -> Self {
        Self {
            key: key.to_string(),
            name,
            description: None,
            tags: BTreeSet::new(),
            sources: Vec::new(),
            custom: None,
        }
    }
}

/// Asset with references resolved, ready to be added; it has no id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub key: String,
    pub name: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub sources: Vec<AssetSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

/// Asset stored on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub key: String,
    pub name: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub sources: Vec<AssetSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

impl Asset {
    /// Give a new asset its platform id
    pub fn from_new(id: String, asset: NewAsset) -> Self {
        Self {
            id,
            key: asset.key,
            name: asset.name,
            description: asset.description,
            tags: asset.tags,
            sources: asset.sources,
            custom: asset.custom,
        }
    }
}

/// The fields that make a price unique on a variant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceScope {
    pub currency_code: String,
    pub country: Option<String>,
    pub channel_id: Option<String>,
    pub customer_group_id: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Price as submitted in a draft; channel and customer group are keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDraft {
    pub value: Money,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub channel_key: Option<String>,
    #[serde(default)]
    pub customer_group_key: Option<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom: Option<CustomFieldsDraft>,
}

impl PriceDraft {
    pub fn new(value: Money) -> Self {
        Self {
            value,
            country: None,
            channel_key: None,
            customer_group_key: None,
            valid_from: None,
            valid_until: None,
            custom: None,
        }
    }
}

/// Price with references resolved, ready to be added; it has no id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrice {
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

impl NewPrice {
    pub fn scope(&self) -> PriceScope {
        PriceScope {
            currency_code: self.value.currency_code.clone(),
            country: self.country.clone(),
            channel_id: self.channel_id.clone(),
            customer_group_id: self.customer_group_id.clone(),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
        }
    }
}

/// Price stored on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub id: String,
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

impl Price {
    /// Give a new price its platform id
    pub fn from_new(id: String, price: NewPrice) -> Self {
        Self {
            id,
            value: price.value,
            country: price.country,
            channel_id: price.channel_id,
            customer_group_id: price.customer_group_id,
            valid_from: price.valid_from,
            valid_until: price.valid_until,
            custom: price.custom,
        }
    }

    pub fn scope(&self) -> PriceScope {
        PriceScope {
            currency_code: self.value.currency_code.clone(),
            country: self.country.clone(),
            channel_id: self.channel_id.clone(),
            customer_group_id: self.customer_group_id.clone(),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
        }
    }
}

/// Serialize a model value for a `SetField` payload.
///
/// Derived `Serialize` impls over string-keyed maps cannot fail.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
