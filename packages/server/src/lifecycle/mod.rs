//! Advertisement lifecycle: status state machine, impression counting and
//! the eligibility view, on top of narrow store adapters.

mod engine;
mod error;
mod models;
mod sea_store;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{AssetCleanupGuard, LifecycleEngine};
pub use error::{LifecycleError, StoreError};
pub use models::{
    AdvertisementChanges, AdvertisementDraft, AdvertisementQuery, Advertisement,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, NewAdvertisement,
};
pub use sea_store::SeaAdvertisementStore;
pub use store::{AdvertisementStore, Page};
