pub mod gateway;
pub mod json_store;
pub mod schema;

pub use gateway::{ProgressStore, RewardDebit, StoreError, StoredText};
pub use json_store::JsonStore;
pub use schema::{LibraryData, ProfileData, TextId, TextRecord};
