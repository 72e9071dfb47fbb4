// 🏷️ Category Registry - fixed classification labels with stable identity
//
// Categories are seeded once when the ledger is created and never change
// afterwards, so a snapshot loaded from storage stays valid for the whole
// process. The registry is passed explicitly to whatever needs name lookups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// CATEGORY
// ============================================================================

/// The fixed, ordered set of ledger categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Income,
    Necessity,
    Pleasure,
    Investment,
    Emergency,
}

impl Category {
    /// Seeding order; identifiers are assigned in this order at initialization
    pub const ALL: [Category; 5] = [
        Category::Income,
        Category::Necessity,
        Category::Pleasure,
        Category::Investment,
        Category::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income => "Income",
            Category::Necessity => "Necessity",
            Category::Pleasure => "Pleasure",
            Category::Investment => "Investment",
            Category::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage identifier of a category row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

/// Immutable name ↔ identifier snapshot
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    by_name: BTreeMap<String, CategoryId>,
    by_id: BTreeMap<CategoryId, String>,
}

impl CategoryRegistry {
    /// Build a registry from `(name, id)` rows as listed by storage
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut registry = CategoryRegistry::default();
        for (name, id) in rows {
            let name = name.into();
            let id = CategoryId(id);
            registry.by_id.insert(id, name.clone());
            registry.by_name.insert(name, id);
        }
        registry
    }

    /// Exact-name lookup, as used by filters
    pub fn resolve(&self, name: &str) -> LedgerResult<CategoryId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::UnknownCategory(name.to_string()))
    }

    /// Case-insensitive lookup, as used when parsing new records
    pub fn resolve_loose(&self, name: &str) -> LedgerResult<CategoryId> {
        let normalized = title_case(name.trim());
        self.by_name.get(&normalized).copied().ok_or_else(|| {
            LedgerError::UnknownCategory(format!(
                "{} (must be one of: {})",
                name,
                self.names().collect::<Vec<_>>().join(",")
            ))
        })
    }

    /// Category names ordered by identifier
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_id.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Title-case a name: first letter of every alphabetic run upper, rest lower
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
