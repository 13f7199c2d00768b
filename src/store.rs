//! Per-wizard form state. Callers receive the store by construction and
//! change it only through [`WizardAction`]s.

use std::{
    collections::HashMap,
    fmt,
    sync::{PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{error::StorableError, form::EditListingForm};

/// Identifies one wizard session, one per navigation route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardKey(String);

impl WizardKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WizardKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for WizardKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for WizardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub form: EditListingForm,
    /// Set once the listing exists upstream; later publishes update it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<Uuid>,
    /// Stock total last saved, used for the next stock update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_stock: Option<u32>,
    pub in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StorableError>,
}

#[derive(Debug, Clone)]
pub enum WizardAction {
    Mount {
        key: WizardKey,
        form: EditListingForm,
        listing_id: Option<Uuid>,
    },
    UpdateForm {
        key: WizardKey,
        form: EditListingForm,
    },
    SelectCategory {
        key: WizardKey,
        category_key: String,
        level: usize,
        id: Option<String>,
    },
    AddImages {
        key: WizardKey,
        images: Vec<Uuid>,
    },
    PublishStarted {
        key: WizardKey,
    },
    /// Ends a started publish that never reached the SDK.
    PublishAborted {
        key: WizardKey,
    },
    PublishSucceeded {
        key: WizardKey,
        listing_id: Uuid,
        stock: Option<u32>,
    },
    PublishFailed {
        key: WizardKey,
        error: StorableError,
    },
    Unmount {
        key: WizardKey,
    },
}

impl WizardAction {
    const fn key(&self) -> &WizardKey {
        match self {
            Self::Mount { key, .. }
            | Self::UpdateForm { key, .. }
            | Self::SelectCategory { key, .. }
            | Self::AddImages { key, .. }
            | Self::PublishStarted { key }
            | Self::PublishAborted { key }
            | Self::PublishSucceeded { key, .. }
            | Self::PublishFailed { key, .. }
            | Self::Unmount { key } => key,
        }
    }
}

/// Typed dispatch/select over wizard state.
pub trait WizardStore: Send + Sync {
    /// Applies an action. Returns `false` when the key isn't mounted (except
    /// for `Mount`, which always succeeds) or, for `PublishStarted`, when a
    /// publish is already running.
    fn dispatch(&self, action: WizardAction) -> bool;

    fn select(&self, key: &WizardKey) -> Option<WizardState>;
}

#[derive(Debug, Default)]
pub struct MemoryWizardStore {
    wizards: RwLock<HashMap<WizardKey, WizardState>>,
}

impl MemoryWizardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.wizards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn reduce(state: &mut WizardState, action: WizardAction) -> bool {
    match action {
        WizardAction::Mount { .. } | WizardAction::Unmount { .. } => {}
        WizardAction::UpdateForm { form, .. } => state.form = form,
        WizardAction::SelectCategory {
            category_key,
            level,
            id,
            ..
        } => state.form.select_category(&category_key, level, id.as_deref()),
        WizardAction::AddImages { images, .. } => {
            for image in images {
                state.form.add_image(image);
            }
        }
        WizardAction::PublishStarted { .. } => {
            if state.in_progress {
                return false;
            }
            state.in_progress = true;
            state.error = None;
        }
        WizardAction::PublishAborted { .. } => state.in_progress = false,
        WizardAction::PublishSucceeded {
            listing_id, stock, ..
        } => {
            state.in_progress = false;
            state.listing_id = Some(listing_id);
            if stock.is_some() {
                state.saved_stock = stock;
            }
        }
        WizardAction::PublishFailed { error, .. } => {
            state.in_progress = false;
            state.error = Some(error);
        }
    }
    true
}

impl WizardStore for MemoryWizardStore {
    fn dispatch(&self, action: WizardAction) -> bool {
        let mut wizards = self
            .wizards
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match action {
            WizardAction::Mount {
                key,
                form,
                listing_id,
            } => {
                debug!(%key, "mounting wizard");
                wizards.insert(
                    key,
                    WizardState {
                        form,
                        listing_id,
                        ..WizardState::default()
                    },
                );
                true
            }
            WizardAction::Unmount { key } => {
                debug!(%key, "unmounting wizard");
                wizards.remove(&key).is_some()
            }
            action => match wizards.get_mut(action.key()) {
                Some(state) => reduce(state, action),
                None => false,
            },
        }
    }

    fn select(&self, key: &WizardKey) -> Option<WizardState> {
        self.wizards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
