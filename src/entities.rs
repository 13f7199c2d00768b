use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::schema::SchemaType;

pub const DEFAULT_CATEGORY_KEY: &str = "categoryLevel";

/// Marketplace settings fetched from the hosted asset service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceConfig {
    pub currency: String,
    #[serde(default)]
    pub listing_types: Vec<ListingTypeConfig>,
    #[serde(default, deserialize_with = "known_entries")]
    pub listing_fields: Vec<ListingField>,
    #[serde(default)]
    pub categories: CategoryConfiguration,
    #[serde(default)]
    pub user_types: Vec<UserTypeConfig>,
    #[serde(default, deserialize_with = "known_entries")]
    pub user_fields: Vec<UserField>,
}

impl MarketplaceConfig {
    pub fn listing_type(&self, listing_type: &str) -> Option<&ListingTypeConfig> {
        self.listing_types
            .iter()
            .find(|config| config.listing_type == listing_type)
    }

    pub fn has_categories(&self) -> bool {
        !self.categories.categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingTypeConfig {
    pub listing_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub default_listing_fields: DefaultListingFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_variations: Option<PriceVariations>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    pub alias: String,
    pub unit_type: String,
}

/// Built-in wizard sections an operator may switch off. `None` means the key
/// was absent from the hosted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultListingFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVariations {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldScope {
    #[default]
    Public,
    Private,
    Protected,
    Meta,
}

impl FieldScope {
    /// Key prefix used for this scope inside flat form values.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Public => "pub_",
            Self::Private => "priv_",
            Self::Protected => "prot_",
            Self::Meta => "meta_",
        }
    }

    pub fn namespaced(self, key: &str) -> String {
        format!("{}{key}", self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    pub option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLimit {
    #[serde(default)]
    pub limit_to_category_ids: bool,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingTypeLimit {
    #[serde(default)]
    pub limit_to_listing_type_ids: bool,
    #[serde(default)]
    pub listing_type_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypeLimit {
    #[serde(default)]
    pub limit_to_user_type_ids: bool,
    #[serde(default)]
    pub user_type_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingField {
    pub key: String,
    #[serde(default)]
    pub scope: FieldScope,
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<EnumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_config: Option<CategoryLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_type_config: Option<ListingTypeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_config: Option<SaveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserField {
    pub key: String,
    #[serde(default)]
    pub scope: FieldScope,
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<EnumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type_config: Option<UserTypeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_config: Option<SaveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypeConfig {
    pub user_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A custom field of either kind, for code that renders or validates both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomField<'a> {
    Listing(&'a ListingField),
    User(&'a UserField),
}

impl<'a> CustomField<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            Self::Listing(field) => field.key.as_str(),
            Self::User(field) => field.key.as_str(),
        }
    }

    pub const fn scope(&self) -> FieldScope {
        match self {
            Self::Listing(field) => field.scope,
            Self::User(field) => field.scope,
        }
    }

    pub const fn schema_type(&self) -> SchemaType {
        match self {
            Self::Listing(field) => field.schema_type,
            Self::User(field) => field.schema_type,
        }
    }

    pub fn enum_options(&self) -> &'a [EnumOption] {
        match self {
            Self::Listing(field) => &field.enum_options,
            Self::User(field) => &field.enum_options,
        }
    }

    pub const fn save_config(&self) -> Option<&'a SaveConfig> {
        match self {
            Self::Listing(field) => field.save_config.as_ref(),
            Self::User(field) => field.save_config.as_ref(),
        }
    }

    pub const fn bounds(&self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::Listing(field) => (field.minimum, field.maximum),
            Self::User(field) => (field.minimum, field.maximum),
        }
    }

    pub fn namespaced_key(&self) -> String {
        self.scope().namespaced(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfiguration {
    #[serde(default = "default_category_key")]
    pub key: String,
    #[serde(default)]
    pub categories: Vec<CategoryNode>,
}

impl Default for CategoryConfiguration {
    fn default() -> Self {
        Self {
            key: default_category_key(),
            categories: Vec::new(),
        }
    }
}

fn default_category_key() -> String {
    DEFAULT_CATEGORY_KEY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<CategoryNode>,
}

/// Deserializes a list, dropping entries that fail to parse (typically a
/// schema type this build doesn't know about).
pub(crate) fn known_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let key = value
                .get("key")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<missing>")
                .to_string();
            match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(%key, %err, "skipping unsupported field definition");
                    None
                }
            }
        })
        .collect())
}
