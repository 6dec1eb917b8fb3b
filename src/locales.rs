//! Locale dictionary persistence and synchronization.

pub mod store;
pub mod sync;

pub use store::{
    LocaleStore,
    StoreError,
};
pub use sync::{
    AddedKeys,
    LocaleResult,
    LocaleStatus,
    NewKeysReport,
    PendingLocale,
    SyncPlan,
    SyncScope,
    Translation,
    apply_plan,
    plan_sync,
    sync_from_reference,
    sync_new_keys,
    translate_missing,
};
