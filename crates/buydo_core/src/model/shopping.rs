//! Store and shopping item records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A place to shop; owns shopping items through `ShoppingItem::store_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    /// Single emoji glyph shown on the store card.
    pub icon: String,
    /// Color token, e.g. `#1D4ED8`.
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// One entry on a store's shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: String,
    /// Owning store. Must resolve to a live `Store` while the item is reachable.
    pub store_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a shopping item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the quantity.
    pub quantity: Option<Option<String>>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    pub is_purchased: Option<bool>,
}

impl ItemPatch {
    /// Applies every set field of this patch to `item`.
    pub fn apply_to(&self, item: &mut ShoppingItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(quantity) = &self.quantity {
            item.quantity = quantity.clone();
        }
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
        if let Some(is_purchased) = self.is_purchased {
            item.is_purchased = is_purchased;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemPatch, ShoppingItem};
    use chrono::Utc;

    #[test]
    fn item_json_uses_camel_case_and_omits_empty_optionals() {
        let item = ShoppingItem {
            id: "i1".to_string(),
            store_id: "s1".to_string(),
            name: "Milk".to_string(),
            quantity: None,
            notes: None,
            is_purchased: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["storeId"], "s1");
        assert_eq!(json["isPurchased"], false);
        assert!(json.get("quantity").is_none());
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut item = ShoppingItem {
            id: "i1".to_string(),
            store_id: "s1".to_string(),
            name: "Milk".to_string(),
            quantity: Some("2".to_string()),
            notes: Some("organic".to_string()),
            is_purchased: false,
            created_at: Utc::now(),
        };
        ItemPatch {
            quantity: Some(None),
            name: Some("Oat milk".to_string()),
            ..ItemPatch::default()
        }
        .apply_to(&mut item);

        assert_eq!(item.name, "Oat milk");
        assert!(item.quantity.is_none());
        assert_eq!(item.notes.as_deref(), Some("organic"));
    }
}
