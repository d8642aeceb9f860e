//! Synchronized collection names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A domain record.
///
/// Records are opaque to the sync layer: each one carries an `id` and an
/// `updatedAt` timestamp, but no business field is ever inspected here.
pub type Record = serde_json::Value;

/// One of the synchronized collections.
///
/// `Categories` rides along with the five primary collections because the
/// cloud backup envelope carries it; a backup file missing the field would
/// not round-trip against other devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    /// Recipe definitions.
    Recipes,
    /// Customer orders.
    Orders,
    /// Customer records.
    Customers,
    /// Ingredient definitions.
    Ingredients,
    /// Stock levels.
    Inventory,
    /// Recipe/product categories.
    Categories,
}

impl CollectionName {
    /// Every synchronized collection, in wire order.
    pub const ALL: [CollectionName; 6] = [
        CollectionName::Recipes,
        CollectionName::Orders,
        CollectionName::Customers,
        CollectionName::Ingredients,
        CollectionName::Inventory,
        CollectionName::Categories,
    ];

    /// Returns the wire name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Recipes => "recipes",
            CollectionName::Orders => "orders",
            CollectionName::Customers => "customers",
            CollectionName::Ingredients => "ingredients",
            CollectionName::Inventory => "inventory",
            CollectionName::Categories => "categories",
        }
    }

    /// Parses a wire name back into a collection.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "recipes" => Some(CollectionName::Recipes),
            "orders" => Some(CollectionName::Orders),
            "customers" => Some(CollectionName::Customers),
            "ingredients" => Some(CollectionName::Ingredients),
            "inventory" => Some(CollectionName::Inventory),
            "categories" => Some(CollectionName::Categories),
            _ => None,
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
