use tracing::{info, warn};

use crate::{
    entities::MarketplaceConfig,
    error::WizardError,
    form::validate_form,
    sdk::{MarketplaceSdk, OwnListing},
    store::{WizardAction, WizardKey, WizardState, WizardStore},
    transform::{stock_update, transform_form_to_listing_data, ListingPayload},
};

fn payload_for(state: &WizardState, config: &MarketplaceConfig) -> Result<ListingPayload, WizardError> {
    let listing_type = state
        .form
        .listing_type
        .as_deref()
        .ok_or(WizardError::MissingListingType)?;
    let listing_type_config = config
        .listing_type(listing_type)
        .ok_or(WizardError::MissingListingType)?;

    let mut payload = transform_form_to_listing_data(
        &state.form,
        &config.currency,
        listing_type,
        &config.categories.key,
        &config.categories.categories,
        &config.listing_fields,
    );
    payload.stock_update = stock_update(&state.form, Some(listing_type_config), state.saved_stock);
    Ok(payload)
}

/// The body the wizard at `key` would publish right now.
pub fn listing_payload(
    store: &dyn WizardStore,
    config: &MarketplaceConfig,
    key: &WizardKey,
) -> Result<ListingPayload, WizardError> {
    let state = store
        .select(key)
        .ok_or_else(|| WizardError::UnknownWizard(key.clone()))?;
    payload_for(&state, config)
}

/// Validates the wizard form and saves it upstream: a new listing on the
/// first publish, an update afterwards.
pub async fn publish<S>(
    sdk: &S,
    store: &dyn WizardStore,
    config: &MarketplaceConfig,
    key: &WizardKey,
) -> Result<OwnListing, WizardError>
where
    S: MarketplaceSdk + ?Sized,
{
    if !store.dispatch(WizardAction::PublishStarted { key: key.clone() }) {
        return Err(match store.select(key) {
            Some(_) => WizardError::PublishInProgress,
            None => WizardError::UnknownWizard(key.clone()),
        });
    }

    // Read after the start so no other publish can change the listing id.
    let prepared = store
        .select(key)
        .ok_or_else(|| WizardError::UnknownWizard(key.clone()))
        .and_then(|state| {
            validate_form(&state.form, config).map_err(WizardError::Validation)?;
            Ok((state.listing_id, payload_for(&state, config)?))
        });
    let (listing_id, payload) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            store.dispatch(WizardAction::PublishAborted { key: key.clone() });
            return Err(err);
        }
    };

    let result = match listing_id {
        Some(id) => sdk.update_listing(id, &payload).await,
        None => sdk.create_listing(&payload).await,
    };

    match result {
        Ok(listing) => {
            info!(%key, listing_id = %listing.id, "listing published");
            store.dispatch(WizardAction::PublishSucceeded {
                key: key.clone(),
                listing_id: listing.id,
                stock: payload.stock_update.map(|update| update.new_total),
            });
            Ok(listing)
        }
        Err(error) => {
            warn!(%key, %error, "publishing listing failed");
            store.dispatch(WizardAction::PublishFailed {
                key: key.clone(),
                error: error.clone(),
            });
            Err(WizardError::Sdk(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::StorableError,
        form::EditListingForm,
        store::MemoryWizardStore,
        testing::FakeSdk,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    /// Finishes another publish of the same wizard right before ours starts.
    struct RacingStore {
        inner: MemoryWizardStore,
        other_listing: Uuid,
        raced: AtomicBool,
    }

    impl WizardStore for RacingStore {
        fn dispatch(&self, action: WizardAction) -> bool {
            if let WizardAction::PublishStarted { key } = &action {
                if !self.raced.swap(true, Ordering::SeqCst) {
                    self.inner
                        .dispatch(WizardAction::PublishStarted { key: key.clone() });
                    self.inner.dispatch(WizardAction::PublishSucceeded {
                        key: key.clone(),
                        listing_id: self.other_listing,
                        stock: Some(3),
                    });
                }
            }
            self.inner.dispatch(action)
        }

        fn select(&self, key: &WizardKey) -> Option<WizardState> {
            self.inner.select(key)
        }
    }

    fn config() -> MarketplaceConfig {
        serde_json::from_value(json!({
            "currency": "USD",
            "listingTypes": [{
                "listingType": "sell",
                "transactionType": { "alias": "default-purchase/release-1", "unitType": "item" },
                "stockType": "multipleItems"
            }]
        }))
        .unwrap()
    }

    fn mounted(store: &MemoryWizardStore) -> WizardKey {
        let key = WizardKey::generate();
        store.dispatch(WizardAction::Mount {
            key: key.clone(),
            form: EditListingForm {
                listing_type: Some("sell".to_string()),
                title: "Road bike".to_string(),
                description: "Fast".to_string(),
                price: Some(50.0),
                stock: Some(3),
                ..EditListingForm::default()
            },
            listing_id: None,
        });
        key
    }

    #[tokio::test]
    async fn first_publish_creates_then_updates() {
        let sdk = FakeSdk::default();
        let store = MemoryWizardStore::new();
        let key = mounted(&store);

        let created = publish(&sdk, &store, &config(), &key).await.unwrap();
        let state = store.select(&key).unwrap();
        assert_eq!(state.listing_id, Some(created.id));
        assert_eq!(state.saved_stock, Some(3));
        assert!(!state.in_progress);

        {
            let created_payloads = sdk.created.lock().unwrap();
            assert_eq!(created_payloads.len(), 1);
            assert_eq!(created_payloads[0].price.as_ref().unwrap().amount, 5000);
            assert_eq!(
                created_payloads[0].stock_update.unwrap().new_total,
                3
            );
        }

        publish(&sdk, &store, &config(), &key).await.unwrap();
        let updated = sdk.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, created.id);
        // stock unchanged since the last save
        assert!(updated[0].1.stock_update.is_none());
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let sdk = FakeSdk::default();
        let store = MemoryWizardStore::new();
        let key = WizardKey::from("empty");
        store.dispatch(WizardAction::Mount {
            key: key.clone(),
            form: EditListingForm::default(),
            listing_id: None,
        });

        let err = publish(&sdk, &store, &config(), &key).await.unwrap_err();
        match err {
            WizardError::Validation(fields) => {
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("type"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(sdk.created.lock().unwrap().is_empty());
        assert!(!store.select(&key).unwrap().in_progress);
    }

    #[tokio::test]
    async fn sdk_failure_is_stored() {
        let sdk = FakeSdk {
            fail_writes: Some(StorableError::new("ApiError", "Forbidden")),
            ..FakeSdk::default()
        };
        let store = MemoryWizardStore::new();
        let key = mounted(&store);

        let err = publish(&sdk, &store, &config(), &key).await.unwrap_err();
        assert!(matches!(err, WizardError::Sdk(_)));
        let state = store.select(&key).unwrap();
        assert!(!state.in_progress);
        assert_eq!(state.error.unwrap().message, "Forbidden");
        assert!(state.listing_id.is_none());
    }

    #[tokio::test]
    async fn publish_in_progress_is_rejected() {
        let sdk = FakeSdk::default();
        let store = MemoryWizardStore::new();
        let key = mounted(&store);
        store.dispatch(WizardAction::PublishStarted { key: key.clone() });

        let err = publish(&sdk, &store, &config(), &key).await.unwrap_err();
        assert!(matches!(err, WizardError::PublishInProgress));
    }

    #[tokio::test]
    async fn listing_saved_concurrently_is_updated_not_duplicated() {
        let sdk = FakeSdk::default();
        let store = RacingStore {
            inner: MemoryWizardStore::new(),
            other_listing: Uuid::new_v4(),
            raced: AtomicBool::new(false),
        };
        let key = mounted(&store.inner);

        let listing = publish(&sdk, &store, &config(), &key).await.unwrap();

        assert!(sdk.created.lock().unwrap().is_empty());
        let updated = sdk.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, store.other_listing);
        assert!(updated[0].1.stock_update.is_none());
        assert_eq!(listing.id, store.other_listing);
    }

    #[tokio::test]
    async fn unknown_wizard() {
        let err = publish(
            &FakeSdk::default(),
            &MemoryWizardStore::new(),
            &config(),
            &WizardKey::from("nope"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WizardError::UnknownWizard(_)));
    }
}
