//! In-process claim store for local development and tests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use m1ssion_types::{Claim, Marker};
use parking_lot::RwLock;

use super::store::{ClaimInsert, ClaimStore, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    markers: RwLock<HashMap<String, Marker>>,
    claims: RwLock<HashMap<(String, String), Claim>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: impl IntoIterator<Item = Marker>) -> Self {
        let store = Self::new();
        for marker in markers {
            store.upsert_marker(marker);
        }
        store
    }

    pub fn upsert_marker(&self, marker: Marker) {
        self.markers.write().insert(marker.id.clone(), marker);
    }

    pub fn claims_for_marker(&self, marker_id: &str) -> Vec<Claim> {
        self.claims
            .read()
            .values()
            .filter(|c| c.marker_id == marker_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn find_marker(&self, marker_id: &str) -> StoreResult<Option<Marker>> {
        Ok(self.markers.read().get(marker_id).cloned())
    }

    async fn claim_exists(&self, marker_id: &str, user_id: &str) -> StoreResult<bool> {
        let key = (marker_id.to_string(), user_id.to_string());
        Ok(self.claims.read().contains_key(&key))
    }

    async fn insert_claim(&self, claim: Claim) -> StoreResult<ClaimInsert> {
        let key = (claim.marker_id.clone(), claim.user_id.clone());
        match self.claims.write().entry(key) {
            Entry::Occupied(_) => Ok(ClaimInsert::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(claim.clone());
                Ok(ClaimInsert::Inserted(claim))
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
