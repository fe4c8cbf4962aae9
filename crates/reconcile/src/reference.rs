//! Reference keys and the per-batch key -> id table

use crate::diff::DiffError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kinds of resources that drafts reference by key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ProductType,
    Category,
    TaxCategory,
    Channel,
    CustomerGroup,
    Type,
}

impl ReferenceKind {
    pub const ALL: [Self; 6] = [
        Self::ProductType,
        Self::Category,
        Self::TaxCategory,
        Self::Channel,
        Self::CustomerGroup,
        Self::Type,
    ];

    /// Whether a missing referenced resource may be created on demand
    pub fn supports_creation(&self) -> bool {
        matches!(self, Self::Channel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductType => "product type",
            Self::Category => "category",
            Self::TaxCategory => "tax category",
            Self::Channel => "channel",
            Self::CustomerGroup => "customer group",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference as written in a draft
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey {
    pub kind: ReferenceKind,
    pub key: String,
}

impl ReferenceKey {
    pub fn new(kind: ReferenceKind, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.key)
    }
}

/// Reference keys resolved to platform ids for one batch
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    ids: HashMap<ReferenceKey, String>,
}

impl ResolvedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ReferenceKind, key: &str, id: &str) {
        self.ids.insert(ReferenceKey::new(kind, key), id.to_string());
    }

    pub fn id(&self, kind: ReferenceKind, key: &str) -> Option<&str> {
        self.ids
            .get(&ReferenceKey::new(kind, key))
            .map(String::as_str)
    }

    pub fn contains(&self, reference: &ReferenceKey) -> bool {
        self.ids.contains_key(reference)
    }

    /// Look up an id, failing with `DiffError::UnresolvedReference`
    pub fn require(&self, kind: ReferenceKind, key: &str) -> Result<String, DiffError> {
        self.id(kind, key)
            .map(str::to_string)
            .ok_or_else(|| DiffError::UnresolvedReference {
                kind,
                key: key.to_string(),
            })
    }

    /// Resolve an optional key
    pub fn require_opt(
        &self,
        kind: ReferenceKind,
        key: Option<&str>,
    ) -> Result<Option<String>, DiffError> {
        key.map(|k| self.require(kind, k)).transpose()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_reference() {
        let mut refs = ResolvedReferences::new();
        refs.insert(ReferenceKind::Channel, "store-1", "ch-1");

        assert_eq!(refs.require(ReferenceKind::Channel, "store-1").unwrap(), "ch-1");
        assert!(matches!(
            refs.require(ReferenceKind::Channel, "store-2"),
            Err(DiffError::UnresolvedReference { kind: ReferenceKind::Channel, .. })
        ));
        // Same key under a different kind is a different reference
        assert!(refs.require(ReferenceKind::Type, "store-1").is_err());
    }

    #[test]
    fn test_only_channels_support_creation() {
        let creatable: Vec<_> = ReferenceKind::ALL
            .iter()
            .filter(|k| k.supports_creation())
            .collect();
        assert_eq!(creatable, vec![&ReferenceKind::Channel]);
    }
}
