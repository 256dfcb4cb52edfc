//! Address domain types.

use serde::{Deserialize, Serialize};

use kiosk_core::AddressId;

/// A stored shipping address as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal: String,
    pub country: String,
    pub is_default: bool,
}

/// Address text fields as submitted by a client; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressFields {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal: Option<String>,
    pub country: Option<String>,
}

impl AddressFields {
    /// Trim every field and treat blank values as absent.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: clean(self.name),
            street: clean(self.street),
            city: clean(self.city),
            state: clean(self.state),
            postal: clean(self.postal),
            country: clean(self.country),
        }
    }

    /// Whether no field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal.is_none()
            && self.country.is_none()
    }
}

/// A fully validated address ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal: String,
    pub country: String,
}

/// A sparse update: only `Some` values are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPatch {
    pub fields: AddressFields,
    /// `Some(true)` promotes the address and demotes the user's other default.
    pub is_default: Option<bool>,
}

impl AddressPatch {
    /// Whether applying the patch would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.is_default.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_fields() {
        let fields = AddressFields {
            name: Some("  Home ".to_owned()),
            street: Some("   ".to_owned()),
            city: Some(String::new()),
            ..AddressFields::default()
        }
        .normalized();

        assert_eq!(fields.name.as_deref(), Some("Home"));
        assert_eq!(fields.street, None);
        assert_eq!(fields.city, None);
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(AddressPatch::default().is_empty());

        let flag_only = AddressPatch {
            is_default: Some(false),
            ..AddressPatch::default()
        };
        assert!(!flag_only.is_empty());

        let field_only = AddressPatch {
            fields: AddressFields {
                city: Some("Berlin".to_owned()),
                ..AddressFields::default()
            },
            is_default: None,
        };
        assert!(!field_only.is_empty());
    }

    #[test]
    fn test_address_serializes_camel_case() {
        let address = Address {
            id: AddressId::new(3),
            name: "Home".to_owned(),
            street: "Main St".to_owned(),
            city: "X".to_owned(),
            state: None,
            postal: "12345".to_owned(),
            country: "DE".to_owned(),
            is_default: true,
        };

        let json = serde_json::to_value(&address).unwrap_or_default();
        assert_eq!(json["isDefault"], serde_json::Value::Bool(true));
        assert_eq!(json["postal"], "12345");
        assert_eq!(json["id"], 3);
    }
}
