use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    category::{select_category_level, selected_path},
    eligibility::{visible_listing_fields, SectionVisibility},
    entities::{CustomField, MarketplaceConfig},
    schema::validate_field_value,
};

/// Flat form values: namespaced custom fields, category levels and the
/// transaction passthrough keys.
pub type FieldValues = Map<String, Value>;

pub type FieldErrors = BTreeMap<String, String>;

pub const AVAILABILITY_PLAN_TYPE: &str = "availability-plan/time";

/// Working state of one edit-listing wizard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditListingForm {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "You need to add a title."))]
    #[serde(default)]
    pub title: String,
    #[validate(length(min = 1, message = "You need to add a description."))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: FieldValues,
    #[validate(range(min = 0.0, message = "Price can't be negative."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[validate]
    #[serde(default)]
    pub price_variants: Vec<PriceVariant>,
    #[validate]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_plan: Option<AvailabilityPlan>,
    #[serde(default)]
    pub images: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<LocationInput>,
    #[validate]
    #[serde(default)]
    pub delivery: DeliveryOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_length_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PriceVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Major units as typed into the form.
    #[validate(range(min = 0.0, message = "Price can't be negative."))]
    pub price_in_subunits: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_length_in_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LatLng>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOptions {
    #[serde(default)]
    pub pickup_enabled: bool,
    #[serde(default)]
    pub shipping_enabled: bool,
    #[validate(range(min = 0.0, message = "Shipping price can't be negative."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_price_in_subunits_one_item: Option<f64>,
    #[validate(range(min = 0.0, message = "Shipping price can't be negative."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_price_in_subunits_additional_items: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPlan {
    #[serde(rename = "type")]
    #[validate(custom = "validate_plan_type")]
    pub plan_type: String,
    #[validate(length(min = 1, message = "Select a time zone."))]
    pub timezone: String,
    #[serde(default)]
    #[validate]
    pub entries: Vec<AvailabilityPlanEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<AvailabilityException>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPlanEntry {
    pub day_of_week: DayOfWeek,
    #[validate(custom = "validate_time_of_day")]
    pub start_time: String,
    #[validate(custom = "validate_time_of_day")]
    pub end_time: String,
    pub seats: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub seats: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn validate_plan_type(plan_type: &str) -> Result<(), ValidationError> {
    if plan_type == AVAILABILITY_PLAN_TYPE {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_plan_type"))
    }
}

fn validate_time_of_day(time: &str) -> Result<(), ValidationError> {
    time_to_minutes(time)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("invalid_time"))
}

/// Parses `HH:MM` (`24:00` allowed as end of day) into minutes after midnight.
fn time_to_minutes(time: &str) -> Option<u32> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    match (hours, minutes) {
        (24, 0) => Some(24 * 60),
        (0..=23, 0..=59) => Some(hours * 60 + minutes),
        _ => None,
    }
}

impl AvailabilityPlan {
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            plan_type: AVAILABILITY_PLAN_TYPE.to_string(),
            timezone: timezone.into(),
            entries: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: AvailabilityPlanEntry) {
        self.entries.push(entry);
    }

    pub fn remove_entry(&mut self, index: usize) -> Option<AvailabilityPlanEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }
}

pub fn start_time_options() -> Vec<String> {
    (0..24).map(|hour| format!("{hour:02}:00")).collect()
}

/// End times selectable after `start_time`: every full hour after it,
/// including `24:00`.
pub fn end_time_options(start_time: &str) -> Vec<String> {
    let start = time_to_minutes(start_time).unwrap_or(0);
    (1..=24)
        .filter(|hour| hour * 60 > start)
        .map(|hour| format!("{hour:02}:00"))
        .collect()
}

impl EditListingForm {
    pub fn add_price_variant(&mut self, variant: PriceVariant) {
        self.price_variants.push(variant);
    }

    pub fn remove_price_variant(&mut self, index: usize) -> Option<PriceVariant> {
        (index < self.price_variants.len()).then(|| self.price_variants.remove(index))
    }

    pub fn add_image(&mut self, image: Uuid) {
        if !self.images.contains(&image) {
            self.images.push(image);
        }
    }

    pub fn remove_image(&mut self, image: Uuid) {
        self.images.retain(|id| *id != image);
    }

    pub fn select_category(&mut self, category_key: &str, level: usize, id: Option<&str>) {
        select_category_level(&mut self.fields, category_key, level, id);
    }

    /// Price the listing would be saved with, in major units.
    pub fn resolved_price(&self) -> Option<f64> {
        self.price_variants
            .first()
            .map(|variant| variant.price_in_subunits)
            .or(self.price)
    }
}

fn collect_errors(errors: &validator::ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = if prefix.is_empty() {
            (*field).to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            validator::ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string);
                    out.entry(name).or_insert(message);
                }
            }
            validator::ValidationErrorsKind::Struct(inner) => collect_errors(inner, &name, out),
            validator::ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, &format!("{name}[{index}]"), out);
                }
            }
        }
    }
}

/// Validates the built-in fields and every custom field visible for the
/// current selection. Hidden fields are not checked.
pub fn validate_form(form: &EditListingForm, config: &MarketplaceConfig) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Err(validation) = form.validate() {
        collect_errors(&validation, "", &mut errors);
    }

    let listing_type = form.listing_type.as_deref();
    if listing_type.is_none() {
        errors.insert("type".to_string(), "Select a listing type.".to_string());
    }

    if let Some(listing_type) = listing_type {
        let category_ids = selected_path(&form.fields, &config.categories.key);
        for field in visible_listing_fields(config, listing_type, &category_ids) {
            let custom = CustomField::Listing(field);
            let key = custom.namespaced_key();
            if let Err(err) = validate_field_value(custom, form.fields.get(&key)) {
                errors.insert(key, err.to_string());
            }
        }

        let sections = SectionVisibility::resolve(config, listing_type, &config.currency);
        if sections.pricing && form.resolved_price().is_none() {
            errors.insert("price".to_string(), "You need to add a price.".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> MarketplaceConfig {
        serde_json::from_value(json!({
            "currency": "USD",
            "listingTypes": [{
                "listingType": "sell",
                "transactionType": { "alias": "default-purchase/release-1", "unitType": "item" }
            }],
            "listingFields": [{
                "key": "brand",
                "schemaType": "text",
                "saveConfig": { "isRequired": true, "requiredMessage": "Add a brand." }
            }, {
                "key": "frame",
                "schemaType": "text",
                "saveConfig": { "isRequired": true },
                "listingTypeConfig": { "limitToListingTypeIds": true, "listingTypeIds": ["rent"] }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn reports_builtin_and_custom_field_errors() {
        let form = EditListingForm {
            listing_type: Some("sell".to_string()),
            description: "Fast bike".to_string(),
            price: Some(-1.0),
            ..EditListingForm::default()
        };

        let errors = validate_form(&form, &config()).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), "You need to add a title.");
        assert_eq!(errors.get("price").unwrap(), "Price can't be negative.");
        assert_eq!(errors.get("pub_brand").unwrap(), "Add a brand.");
        // hidden for this listing type
        assert!(!errors.contains_key("pub_frame"));
    }

    #[test]
    fn valid_form_passes() {
        let mut form = EditListingForm {
            listing_type: Some("sell".to_string()),
            title: "Road bike".to_string(),
            description: "Fast bike".to_string(),
            price: Some(120.0),
            ..EditListingForm::default()
        };
        form.fields.insert("pub_brand".to_string(), json!("Canyon"));
        assert_eq!(validate_form(&form, &config()), Ok(()));
    }

    #[test]
    fn nested_availability_errors_are_named() {
        let mut plan = AvailabilityPlan::new("Europe/Helsinki");
        plan.add_entry(AvailabilityPlanEntry {
            day_of_week: DayOfWeek::Mon,
            start_time: "25:00".to_string(),
            end_time: "17:00".to_string(),
            seats: 1,
        });
        let form = EditListingForm {
            listing_type: Some("sell".to_string()),
            title: "Road bike".to_string(),
            description: "Fast bike".to_string(),
            price: Some(1.0),
            availability_plan: Some(plan),
            fields: json!({ "pub_brand": "Canyon" }).as_object().cloned().unwrap(),
            ..EditListingForm::default()
        };

        let errors = validate_form(&form, &config()).unwrap_err();
        assert_eq!(
            errors.get("availability_plan.entries[0].start_time").unwrap(),
            "invalid_time"
        );
    }

    #[test]
    fn end_times_follow_start_time() {
        let options = end_time_options("22:00");
        assert_eq!(options, vec!["23:00".to_string(), "24:00".to_string()]);
        assert_eq!(start_time_options().len(), 24);
    }

    #[test]
    fn field_array_operations() {
        let mut form = EditListingForm::default();
        form.add_price_variant(PriceVariant {
            name: Some("1h".to_string()),
            price_in_subunits: 50.0,
            booking_length_in_minutes: Some(60),
        });
        form.price = Some(10.0);
        assert_eq!(form.resolved_price(), Some(50.0));
        assert!(form.remove_price_variant(3).is_none());
        assert!(form.remove_price_variant(0).is_some());
        assert_eq!(form.resolved_price(), Some(10.0));

        let image = Uuid::new_v4();
        form.add_image(image);
        form.add_image(image);
        assert_eq!(form.images.len(), 1);
        form.remove_image(image);
        assert!(form.images.is_empty());

        let mut plan = AvailabilityPlan::new("UTC");
        assert!(plan.remove_entry(0).is_none());
    }
}
