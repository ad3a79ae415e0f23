use m1ssion_types::{Claim, Marker};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of the authoritative claim insert
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimInsert {
    Inserted(Claim),
    /// A claim for `(marker_id, user_id)` already exists
    Duplicate,
}

/// Marker lookup and claim persistence.
///
/// `insert_claim` must be atomic with respect to `(marker_id, user_id)`: of any
/// number of concurrent inserts for the same pair, exactly one returns
/// `Inserted`. `claim_exists` is only a cheap pre-check and gives no guarantee.
#[async_trait::async_trait]
pub trait ClaimStore: Send + Sync {
    async fn find_marker(&self, marker_id: &str) -> StoreResult<Option<Marker>>;
    async fn claim_exists(&self, marker_id: &str, user_id: &str) -> StoreResult<bool>;
    async fn insert_claim(&self, claim: Claim) -> StoreResult<ClaimInsert>;
    async fn ping(&self) -> StoreResult<()>;
}
