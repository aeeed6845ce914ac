use thiserror::Error;

use crate::store::schema::TextId;

/// Outcome of a coin deduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardDebit {
    /// Coins were taken; carries the new balance.
    Applied(u64),
    /// The balance was already zero, so nothing was written.
    AlreadyZero,
}

/// A text loaded for practice, together with its saved progress.
#[derive(Clone, Debug)]
pub struct StoredText {
    pub id: TextId,
    pub title: String,
    pub content: String,
    pub progress_index: usize,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no text with id '{0}'")]
    NotFound(TextId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything the practice flow needs from persistence. Session effects
/// map one-to-one onto these calls.
///
/// `JsonStore` implements it over the local data directory; library
/// management (import, listing, removal) stays on the store type itself.
pub trait ProgressStore {
    /// Fetch a text and its saved progress index.
    fn load_text(&self, id: &TextId) -> Result<StoredText, StoreError>;

    /// Persist the flat progress index for `id`.
    fn save_progress(&self, id: &TextId, flat_index: usize) -> Result<(), StoreError>;

    /// Fold one committed line into the lifetime totals.
    fn record_line_completion(&self, seconds: f64, accuracy_percent: u8)
    -> Result<(), StoreError>;

    /// Add coins to the balance; returns the new total.
    fn increment_reward(&self, amount: u32) -> Result<u64, StoreError>;

    /// Take coins from the balance, reporting when it was already empty.
    fn decrement_reward(&self, amount: u32) -> Result<RewardDebit, StoreError>;

    /// Mark `id` completed and bump its completion count.
    fn record_text_completion(&self, id: &TextId) -> Result<(), StoreError>;
}
