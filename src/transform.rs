//! Mapping between the wizard form and the listing body the marketplace API
//! accepts. Everything here is pure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    category::{category_depth, category_level_key, parse_category_level, pick_category_fields},
    currency::{to_subunits, Money},
    eligibility::{is_field_for_category, is_field_for_listing_type, is_field_for_user_type, show_stock},
    entities::{CategoryNode, FieldScope, ListingField, ListingTypeConfig, MarketplaceConfig, UserField},
    form::{
        AvailabilityPlan, DeliveryOptions, EditListingForm, FieldValues, LatLng, LocationInput,
        PriceVariant,
    },
    sdk::OwnListing,
};

pub const TRANSACTION_PROCESS_ALIAS: &str = "transactionProcessAlias";
pub const UNIT_TYPE: &str = "unitType";

/// Category levels always nulled before the resolved path is written.
const MIN_CLEARED_CATEGORY_LEVELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    pub images: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_plan: Option<AvailabilityPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_update: Option<StockUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_total: Option<u32>,
    pub new_total: u32,
}

/// Picks the custom listing fields of `scope` out of namespaced form values.
///
/// Applicable fields carry their value (or `null` when unset). Fields of the
/// same scope that don't apply to the listing type or categories are written
/// as `null` so a stale value is removed server side.
pub fn pick_listing_fields_data(
    data: &FieldValues,
    scope: FieldScope,
    listing_type: &str,
    category_ids: &[String],
    listing_fields: &[ListingField],
) -> Map<String, Value> {
    listing_fields
        .iter()
        .filter(|field| field.scope == scope)
        .map(|field| {
            let applies = is_field_for_listing_type(listing_type, field)
                && is_field_for_category(category_ids, field);
            let value = if applies {
                data.get(&scope.namespaced(&field.key))
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                Value::Null
            };
            (field.key.clone(), value)
        })
        .collect()
}

/// Same picker for user profile fields.
pub fn pick_user_fields_data(
    data: &FieldValues,
    scope: FieldScope,
    user_type: &str,
    user_fields: &[UserField],
) -> Map<String, Value> {
    user_fields
        .iter()
        .filter(|field| field.scope == scope)
        .map(|field| {
            let value = if is_field_for_user_type(user_type, field) {
                data.get(&scope.namespaced(&field.key))
                    .cloned()
                    .unwrap_or(Value::Null)
            } else {
                Value::Null
            };
            (field.key.clone(), value)
        })
        .collect()
}

fn location_data(location: &LocationInput) -> Value {
    json!({
        "address": location.address,
        "building": location.building.clone().unwrap_or_default(),
    })
}

fn non_empty(map: Map<String, Value>) -> Option<Map<String, Value>> {
    (!map.is_empty()).then_some(map)
}

fn insert_if_present(public: &mut Map<String, Value>, fields: &FieldValues, key: &str) {
    if let Some(value) = fields.get(key).filter(|value| !value.is_null()) {
        public.insert(key.to_string(), value.clone());
    }
}

fn insert_delivery(public: &mut Map<String, Value>, delivery: &DeliveryOptions) {
    if delivery.pickup_enabled {
        public.insert("pickupEnabled".to_string(), Value::Bool(true));
    }
    if delivery.shipping_enabled {
        public.insert("shippingEnabled".to_string(), Value::Bool(true));
    }
    let shipping_prices = [
        (
            "shippingPriceInSubunitsOneItem",
            delivery.shipping_price_in_subunits_one_item,
        ),
        (
            "shippingPriceInSubunitsAdditionalItems",
            delivery.shipping_price_in_subunits_additional_items,
        ),
    ];
    for (key, price) in shipping_prices {
        if let Some(price) = price.filter(|price| price.abs() > f64::EPSILON) {
            public.insert(key.to_string(), json!(to_subunits(price)));
        }
    }
}

/// Builds the create/update body from the wizard form.
pub fn transform_form_to_listing_data(
    form: &EditListingForm,
    marketplace_currency: &str,
    listing_type: &str,
    category_key: &str,
    listing_categories: &[CategoryNode],
    listing_fields: &[ListingField],
) -> ListingPayload {
    let mut public = Map::new();
    public.insert("listingType".to_string(), json!(listing_type));
    insert_if_present(&mut public, &form.fields, TRANSACTION_PROCESS_ALIAS);
    insert_if_present(&mut public, &form.fields, UNIT_TYPE);

    if !form.price_variants.is_empty() {
        let variants: Vec<Value> = form
            .price_variants
            .iter()
            .map(|variant| {
                let mut data = Map::new();
                if let Some(name) = &variant.name {
                    data.insert("name".to_string(), json!(name));
                }
                data.insert(
                    "priceInSubunits".to_string(),
                    json!(to_subunits(variant.price_in_subunits)),
                );
                if let Some(minutes) = variant.booking_length_in_minutes {
                    data.insert("bookingLengthInMinutes".to_string(), json!(minutes));
                }
                Value::Object(data)
            })
            .collect();
        public.insert("priceVariants".to_string(), Value::Array(variants));
        public.insert("priceVariationsEnabled".to_string(), Value::Bool(true));
    }

    if let Some(minutes) = form.booking_length_in_minutes.filter(|minutes| *minutes > 0) {
        public.insert("bookingLengthInMinutes".to_string(), json!(minutes));
    }
    if let Some(interval) = form
        .start_time_interval
        .as_ref()
        .filter(|interval| !interval.is_empty())
    {
        public.insert("startTimeInterval".to_string(), json!(interval));
    }
    insert_delivery(&mut public, &form.delivery);

    let cleared_levels = category_depth(listing_categories).max(MIN_CLEARED_CATEGORY_LEVELS);
    for level in 1..=cleared_levels {
        public.insert(category_level_key(category_key, level), Value::Null);
    }
    let categories = pick_category_fields(&form.fields, category_key, listing_categories);
    let category_ids: Vec<String> = categories
        .values()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    public.extend(categories);

    if let Some(location) = form.location.as_ref().filter(|l| !l.address.is_empty()) {
        public.insert("location".to_string(), location_data(location));
    }
    if let Some(pickup) = form
        .pickup_location
        .as_ref()
        .filter(|l| !l.address.is_empty())
    {
        public.insert("pickupLocation".to_string(), location_data(pickup));
    }
    let geolocation = form
        .location
        .as_ref()
        .and_then(|location| location.origin)
        .or_else(|| form.pickup_location.as_ref().and_then(|l| l.origin));

    public.extend(pick_listing_fields_data(
        &form.fields,
        FieldScope::Public,
        listing_type,
        &category_ids,
        listing_fields,
    ));
    let private = pick_listing_fields_data(
        &form.fields,
        FieldScope::Private,
        listing_type,
        &category_ids,
        listing_fields,
    );

    ListingPayload {
        title: form.title.clone(),
        description: form.description.clone(),
        price: form
            .resolved_price()
            .map(|price| Money::from_major(price, marketplace_currency)),
        images: form.images.clone(),
        geolocation,
        availability_plan: form.availability_plan.clone(),
        public_data: non_empty(public),
        private_data: non_empty(private),
        stock_update: None,
    }
}

/// Stock change for listing types that track stock.
pub fn stock_update(
    form: &EditListingForm,
    listing_type: Option<&ListingTypeConfig>,
    old_total: Option<u32>,
) -> Option<StockUpdate> {
    if !show_stock(listing_type) {
        return None;
    }
    let new_total = form.stock?;
    (old_total != Some(new_total)).then_some(StockUpdate {
        old_total,
        new_total,
    })
}

#[allow(clippy::cast_precision_loss)]
fn major(value: &Value) -> Option<f64> {
    value.as_i64().map(|subunits| subunits as f64 / 100.0)
}

fn location_input(value: Option<&Value>, origin: Option<LatLng>) -> Option<LocationInput> {
    let value = value?;
    Some(LocationInput {
        address: value.get("address")?.as_str()?.to_string(),
        building: value
            .get("building")
            .and_then(Value::as_str)
            .filter(|building| !building.is_empty())
            .map(str::to_string),
        origin,
    })
}

/// Rebuilds wizard form values from an existing listing for editing.
pub fn initial_form_values(listing: &OwnListing, config: &MarketplaceConfig) -> EditListingForm {
    let attributes = &listing.attributes;
    let public = &attributes.public_data;
    let private = &attributes.private_data;
    let category_key = &config.categories.key;

    let mut fields = FieldValues::new();
    for key in [TRANSACTION_PROCESS_ALIAS, UNIT_TYPE] {
        insert_if_present(&mut fields, public, key);
    }
    for (key, value) in public {
        if parse_category_level(category_key, key).is_some() && !value.is_null() {
            fields.insert(key.clone(), value.clone());
        }
    }
    for field in &config.listing_fields {
        let source = match field.scope {
            FieldScope::Public => public,
            FieldScope::Private => private,
            FieldScope::Protected | FieldScope::Meta => continue,
        };
        if let Some(value) = source.get(&field.key).filter(|value| !value.is_null()) {
            fields.insert(field.scope.namespaced(&field.key), value.clone());
        }
    }

    let price_variants = public
        .get("priceVariants")
        .and_then(Value::as_array)
        .map(|variants| {
            variants
                .iter()
                .filter_map(|variant| {
                    Some(PriceVariant {
                        name: variant.get("name").and_then(Value::as_str).map(str::to_string),
                        price_in_subunits: major(variant.get("priceInSubunits")?)?,
                        booking_length_in_minutes: variant
                            .get("bookingLengthInMinutes")
                            .and_then(Value::as_u64)
                            .and_then(|minutes| u32::try_from(minutes).ok()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let flag = |key: &str| public.get(key).and_then(Value::as_bool).unwrap_or(false);
    let delivery = DeliveryOptions {
        pickup_enabled: flag("pickupEnabled"),
        shipping_enabled: flag("shippingEnabled"),
        shipping_price_in_subunits_one_item: public
            .get("shippingPriceInSubunitsOneItem")
            .and_then(major),
        shipping_price_in_subunits_additional_items: public
            .get("shippingPriceInSubunitsAdditionalItems")
            .and_then(major),
    };

    EditListingForm {
        listing_type: public
            .get("listingType")
            .and_then(Value::as_str)
            .map(str::to_string),
        title: attributes.title.clone(),
        description: attributes.description.clone(),
        fields,
        price: attributes.price.as_ref().map(Money::to_major),
        price_variants,
        availability_plan: attributes.availability_plan.clone(),
        images: listing.images.clone(),
        location: location_input(public.get("location"), attributes.geolocation),
        pickup_location: location_input(public.get("pickupLocation"), attributes.geolocation),
        delivery,
        booking_length_in_minutes: public
            .get("bookingLengthInMinutes")
            .and_then(Value::as_u64)
            .and_then(|minutes| u32::try_from(minutes).ok()),
        start_time_interval: public
            .get("startTimeInterval")
            .and_then(Value::as_str)
            .map(str::to_string),
        stock: None,
    }
}
