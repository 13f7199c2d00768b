//! Visibility rules for wizard sections and custom fields.
//!
//! Every predicate fails closed: a missing listing type config hides the
//! section instead of raising an error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    category::{lookup_selection, selected_path},
    currency::is_valid_currency_for_transaction_process,
    entities::{ListingField, ListingTypeConfig, MarketplaceConfig, UserField},
};

pub fn is_field_for_listing_type(listing_type: &str, field: &ListingField) -> bool {
    field.listing_type_config.as_ref().map_or(true, |limit| {
        !limit.limit_to_listing_type_ids
            || limit.listing_type_ids.iter().any(|id| id == listing_type)
    })
}

pub fn is_field_for_category(category_ids: &[String], field: &ListingField) -> bool {
    field.category_config.as_ref().map_or(true, |limit| {
        !limit.limit_to_category_ids
            || limit
                .category_ids
                .iter()
                .any(|id| category_ids.contains(id))
    })
}

pub fn is_field_for_user_type(user_type: &str, field: &UserField) -> bool {
    field.user_type_config.as_ref().map_or(true, |limit| {
        !limit.limit_to_user_type_ids || limit.user_type_ids.iter().any(|id| id == user_type)
    })
}

/// Custom listing fields to render for the current type and category path.
pub fn visible_listing_fields<'a>(
    config: &'a MarketplaceConfig,
    listing_type: &str,
    category_ids: &[String],
) -> Vec<&'a ListingField> {
    config
        .listing_fields
        .iter()
        .filter(|field| {
            is_field_for_listing_type(listing_type, field)
                && is_field_for_category(category_ids, field)
        })
        .collect()
}

pub fn user_fields_for_type<'a>(config: &'a MarketplaceConfig, user_type: &str) -> Vec<&'a UserField> {
    config
        .user_fields
        .iter()
        .filter(|field| is_field_for_user_type(user_type, field))
        .collect()
}

/// Whether the listing type's transaction process can charge in `currency`.
pub fn is_currency_supported(listing_type: Option<&ListingTypeConfig>, currency: &str) -> bool {
    listing_type.is_some_and(|config| {
        is_valid_currency_for_transaction_process(&config.transaction_type.alias, currency)
    })
}

pub fn show_photos(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type.is_some_and(|config| config.default_listing_fields.images != Some(false))
}

pub fn show_pricing(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type.is_some_and(|config| config.default_listing_fields.price != Some(false))
}

pub fn show_location(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type.is_some_and(|config| config.default_listing_fields.location != Some(false))
}

/// Delivery is shown unless both pickup and shipping are switched off.
pub fn show_delivery(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type.is_some_and(|config| {
        let fields = config.default_listing_fields;
        !(fields.pickup == Some(false) && fields.shipping == Some(false))
    })
}

pub fn show_stock(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type
        .and_then(|config| config.stock_type.as_deref())
        .is_some_and(|stock_type| !stock_type.is_empty())
}

pub fn show_availability(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type.is_some_and(|config| config.default_listing_fields.availability == Some(true))
}

pub fn price_variations_enabled(listing_type: Option<&ListingTypeConfig>) -> bool {
    listing_type
        .and_then(|config| config.price_variations)
        .is_some_and(|variations| variations.enabled)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct SectionVisibility {
    pub currency_supported: bool,
    pub details: bool,
    pub categories: bool,
    pub pricing: bool,
    pub price_variations: bool,
    pub photos: bool,
    pub stock: bool,
    pub delivery: bool,
    pub availability: bool,
    pub location: bool,
}

impl SectionVisibility {
    /// Resolves every section gate. The currency check runs first; when it
    /// fails nothing is shown.
    pub fn resolve(config: &MarketplaceConfig, listing_type: &str, currency: &str) -> Self {
        let listing_type_config = config.listing_type(listing_type);
        if !is_currency_supported(listing_type_config, currency) {
            return Self::default();
        }
        Self {
            currency_supported: true,
            details: true,
            categories: config.has_categories(),
            pricing: show_pricing(listing_type_config),
            price_variations: price_variations_enabled(listing_type_config),
            photos: show_photos(listing_type_config),
            stock: show_stock(listing_type_config),
            delivery: show_delivery(listing_type_config),
            availability: show_availability(listing_type_config),
            location: show_location(listing_type_config),
        }
    }
}

/// Whether the details form below the category picker should render: a
/// listing type with a supported currency is selected, and either there are
/// no categories or the selected path has reached its end.
pub fn show_details_form(
    config: &MarketplaceConfig,
    listing_type: Option<&str>,
    fields: &Map<String, Value>,
    currency: &str,
) -> bool {
    let Some(listing_type) = listing_type else {
        return false;
    };
    if !is_currency_supported(config.listing_type(listing_type), currency) {
        return false;
    }
    if !config.has_categories() {
        return true;
    }
    let path = selected_path(fields, &config.categories.key);
    lookup_selection(&config.categories.categories, &path).is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CategoryLimit, DefaultListingFields, ListingTypeLimit, TransactionType};
    use crate::schema::SchemaType;
    use serde_json::json;

    fn listing_type(fields: DefaultListingFields, stock_type: Option<&str>) -> ListingTypeConfig {
        ListingTypeConfig {
            listing_type: "sell".to_string(),
            label: None,
            transaction_type: TransactionType {
                process: None,
                alias: "default-purchase/release-1".to_string(),
                unit_type: "item".to_string(),
            },
            default_listing_fields: fields,
            stock_type: stock_type.map(str::to_string),
            price_variations: None,
        }
    }

    fn field(listing_types: Option<&[&str]>, categories: Option<&[&str]>) -> ListingField {
        let to_vec = |ids: &[&str]| -> Vec<String> { ids.iter().map(|id| (*id).to_string()).collect() };
        ListingField {
            key: "gears".to_string(),
            scope: crate::entities::FieldScope::Public,
            schema_type: SchemaType::Long,
            enum_options: vec![],
            category_config: categories.map(|ids| CategoryLimit {
                limit_to_category_ids: true,
                category_ids: to_vec(ids),
            }),
            listing_type_config: listing_types.map(|ids| ListingTypeLimit {
                limit_to_listing_type_ids: true,
                listing_type_ids: to_vec(ids),
            }),
            save_config: None,
            minimum: None,
            maximum: None,
        }
    }

    #[test]
    fn photos_hidden_only_when_explicitly_disabled() {
        let hidden = listing_type(
            DefaultListingFields {
                images: Some(false),
                ..DefaultListingFields::default()
            },
            None,
        );
        assert!(!show_photos(Some(&hidden)));

        let absent = listing_type(DefaultListingFields::default(), None);
        assert!(show_photos(Some(&absent)));
        assert!(show_location(Some(&absent)));
        assert!(show_pricing(Some(&absent)));
        assert!(show_delivery(Some(&absent)));
    }

    #[test]
    fn stock_and_availability_are_opt_in() {
        let absent = listing_type(DefaultListingFields::default(), None);
        assert!(!show_stock(Some(&absent)));
        assert!(!show_availability(Some(&absent)));

        let empty = listing_type(DefaultListingFields::default(), Some(""));
        assert!(!show_stock(Some(&empty)));

        let stocked = listing_type(
            DefaultListingFields {
                availability: Some(true),
                ..DefaultListingFields::default()
            },
            Some("multipleItems"),
        );
        assert!(show_stock(Some(&stocked)));
        assert!(show_availability(Some(&stocked)));
    }

    #[test]
    fn delivery_hidden_when_both_methods_disabled() {
        let pickup_only = listing_type(
            DefaultListingFields {
                shipping: Some(false),
                ..DefaultListingFields::default()
            },
            None,
        );
        assert!(show_delivery(Some(&pickup_only)));

        let neither = listing_type(
            DefaultListingFields {
                shipping: Some(false),
                pickup: Some(false),
                ..DefaultListingFields::default()
            },
            None,
        );
        assert!(!show_delivery(Some(&neither)));
    }

    #[test]
    fn missing_config_hides_everything() {
        assert!(!show_photos(None));
        assert!(!show_pricing(None));
        assert!(!show_delivery(None));
        assert!(!show_location(None));
        assert!(!is_currency_supported(None, "USD"));

        let config = MarketplaceConfig {
            currency: "USD".to_string(),
            ..MarketplaceConfig::default()
        };
        assert_eq!(
            SectionVisibility::resolve(&config, "sell", "USD"),
            SectionVisibility::default()
        );
    }

    #[test]
    fn unsupported_currency_suppresses_sections() {
        let config = MarketplaceConfig {
            currency: "XYZ".to_string(),
            listing_types: vec![listing_type(DefaultListingFields::default(), None)],
            ..MarketplaceConfig::default()
        };
        let sections = SectionVisibility::resolve(&config, "sell", "XYZ");
        assert!(!sections.currency_supported);
        assert!(!sections.pricing);
        assert!(!sections.details);

        let sections = SectionVisibility::resolve(&config, "sell", "USD");
        assert!(sections.pricing && sections.details && sections.photos);
        assert!(!sections.categories);
    }

    #[test]
    fn field_restrictions() {
        let restricted = field(Some(&["a"][..]), None);
        assert!(is_field_for_listing_type("a", &restricted));
        assert!(!is_field_for_listing_type("b", &restricted));

        let unrestricted = field(None, None);
        assert!(is_field_for_listing_type("b", &unrestricted));

        let by_category = field(None, Some(&["bikes", "parts"][..]));
        assert!(is_field_for_category(&["parts".to_string()], &by_category));
        assert!(!is_field_for_category(&["cars".to_string()], &by_category));
        assert!(!is_field_for_category(&[], &by_category));
    }

    #[test]
    fn details_form_waits_for_leaf_category() {
        let mut config: MarketplaceConfig = serde_json::from_value(json!({
            "currency": "USD",
            "categories": { "categories": [
                { "id": "bikes", "name": "Bikes", "subcategories": [{ "id": "city", "name": "City" }] }
            ]}
        }))
        .unwrap();
        config
            .listing_types
            .push(listing_type(DefaultListingFields::default(), None));

        let fields = |value: serde_json::Value| value.as_object().cloned().unwrap();
        assert!(!show_details_form(&config, None, &Map::new(), "USD"));
        assert!(!show_details_form(&config, Some("sell"), &Map::new(), "USD"));
        assert!(!show_details_form(
            &config,
            Some("sell"),
            &fields(json!({ "categoryLevel1": "bikes" })),
            "USD"
        ));
        assert!(show_details_form(
            &config,
            Some("sell"),
            &fields(json!({ "categoryLevel1": "bikes", "categoryLevel2": "city" })),
            "USD"
        ));
        // stale id, treated as terminal
        assert!(show_details_form(
            &config,
            Some("sell"),
            &fields(json!({ "categoryLevel1": "boats" })),
            "USD"
        ));

        config.categories.categories.clear();
        assert!(show_details_form(&config, Some("sell"), &Map::new(), "USD"));
    }
}
