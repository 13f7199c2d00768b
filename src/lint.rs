//! Consistency checks for a marketplace configuration.

use std::{collections::HashSet, fmt};

use crate::{
    eligibility::is_currency_supported,
    entities::{CategoryNode, MarketplaceConfig},
    schema::{InputKind, SchemaType},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    DuplicateCategory { id: String },
    UnknownListingType { field: String, listing_type: String },
    UnknownCategory { field: String, category: String },
    UnknownUserType { field: String, user_type: String },
    MissingEnumOptions { field: String },
    UnsupportedCurrency { listing_type: String, currency: String },
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCategory { id } => write!(f, "category id {id} appears more than once"),
            Self::UnknownListingType {
                field,
                listing_type,
            } => write!(f, "field {field} is limited to unknown listing type {listing_type}"),
            Self::UnknownCategory { field, category } => {
                write!(f, "field {field} is limited to unknown category {category}")
            }
            Self::UnknownUserType { field, user_type } => {
                write!(f, "user field {field} is limited to unknown user type {user_type}")
            }
            Self::MissingEnumOptions { field } => write!(f, "field {field} has no options"),
            Self::UnsupportedCurrency {
                listing_type,
                currency,
            } => write!(
                f,
                "listing type {listing_type} can't be priced in {currency}"
            ),
        }
    }
}

fn collect_category_ids<'a>(
    categories: &'a [CategoryNode],
    seen: &mut HashSet<&'a str>,
    issues: &mut Vec<LintIssue>,
) {
    for category in categories {
        if !seen.insert(&category.id) {
            issues.push(LintIssue::DuplicateCategory {
                id: category.id.clone(),
            });
        }
        collect_category_ids(&category.subcategories, seen, issues);
    }
}

const fn needs_options(schema_type: SchemaType) -> bool {
    matches!(
        schema_type.input_kind(),
        InputKind::Select | InputKind::CheckboxGroup
    )
}

pub fn lint_config(config: &MarketplaceConfig) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    let mut category_ids = HashSet::new();
    collect_category_ids(&config.categories.categories, &mut category_ids, &mut issues);

    let listing_types: HashSet<&str> = config
        .listing_types
        .iter()
        .map(|listing_type| listing_type.listing_type.as_str())
        .collect();
    let user_types: HashSet<&str> = config
        .user_types
        .iter()
        .map(|user_type| user_type.user_type.as_str())
        .collect();

    for field in &config.listing_fields {
        if let Some(limit) = &field.listing_type_config {
            for listing_type in &limit.listing_type_ids {
                if !listing_types.contains(listing_type.as_str()) {
                    issues.push(LintIssue::UnknownListingType {
                        field: field.key.clone(),
                        listing_type: listing_type.clone(),
                    });
                }
            }
        }
        if let Some(limit) = &field.category_config {
            for category in &limit.category_ids {
                if !category_ids.contains(category.as_str()) {
                    issues.push(LintIssue::UnknownCategory {
                        field: field.key.clone(),
                        category: category.clone(),
                    });
                }
            }
        }
        if needs_options(field.schema_type) && field.enum_options.is_empty() {
            issues.push(LintIssue::MissingEnumOptions {
                field: field.key.clone(),
            });
        }
    }

    for field in &config.user_fields {
        if let Some(limit) = &field.user_type_config {
            for user_type in &limit.user_type_ids {
                if !user_types.contains(user_type.as_str()) {
                    issues.push(LintIssue::UnknownUserType {
                        field: field.key.clone(),
                        user_type: user_type.clone(),
                    });
                }
            }
        }
        if needs_options(field.schema_type) && field.enum_options.is_empty() {
            issues.push(LintIssue::MissingEnumOptions {
                field: field.key.clone(),
            });
        }
    }

    for listing_type in &config.listing_types {
        if !is_currency_supported(Some(listing_type), &config.currency) {
            issues.push(LintIssue::UnsupportedCurrency {
                listing_type: listing_type.listing_type.clone(),
                currency: config.currency.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_config_has_no_issues() {
        let config: MarketplaceConfig = serde_json::from_value(json!({
            "currency": "USD",
            "listingTypes": [{
                "listingType": "sell",
                "transactionType": { "alias": "default-purchase/release-1", "unitType": "item" }
            }],
            "listingFields": [{
                "key": "color",
                "schemaType": "enum",
                "enumOptions": [{ "option": "red", "label": "Red" }],
                "listingTypeConfig": { "limitToListingTypeIds": true, "listingTypeIds": ["sell"] }
            }],
            "categories": { "categories": [{ "id": "bikes", "name": "Bikes" }] }
        }))
        .unwrap();
        assert!(lint_config(&config).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let config: MarketplaceConfig = serde_json::from_value(json!({
            "currency": "XYZ",
            "listingTypes": [{
                "listingType": "sell",
                "transactionType": { "alias": "default-purchase/release-1", "unitType": "item" }
            }],
            "listingFields": [{
                "key": "color",
                "schemaType": "enum",
                "listingTypeConfig": { "limitToListingTypeIds": true, "listingTypeIds": ["rent"] },
                "categoryConfig": { "limitToCategoryIds": true, "categoryIds": ["cars"] }
            }],
            "userTypes": [{ "userType": "seller" }],
            "userFields": [{
                "key": "shop",
                "schemaType": "text",
                "userTypeConfig": { "limitToUserTypeIds": true, "userTypeIds": ["buyer"] }
            }],
            "categories": { "categories": [
                { "id": "bikes", "name": "Bikes", "subcategories": [{ "id": "bikes", "name": "Again" }] }
            ] }
        }))
        .unwrap();

        let issues = lint_config(&config);
        assert_eq!(
            issues,
            vec![
                LintIssue::DuplicateCategory { id: "bikes".to_string() },
                LintIssue::UnknownListingType {
                    field: "color".to_string(),
                    listing_type: "rent".to_string()
                },
                LintIssue::UnknownCategory {
                    field: "color".to_string(),
                    category: "cars".to_string()
                },
                LintIssue::MissingEnumOptions { field: "color".to_string() },
                LintIssue::UnknownUserType {
                    field: "shop".to_string(),
                    user_type: "buyer".to_string()
                },
                LintIssue::UnsupportedCurrency {
                    listing_type: "sell".to_string(),
                    currency: "XYZ".to_string()
                },
            ]
        );
    }
}
