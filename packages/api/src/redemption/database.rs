use chrono::Utc;
use m1ssion_types::{Claim, Coordinates, Marker, Reward};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Schema, SqlErr, sea_query::OnConflict,
};

use super::store::{ClaimInsert, ClaimStore, StoreResult};
use crate::entity::{marker, marker_claim};

/// Postgres-backed store. The `(marker_id, user_id)` primary key of
/// `marker_claims` is the only thing that serialises concurrent claims.
#[derive(Debug, Clone)]
pub struct DatabaseClaimStore {
    db: DatabaseConnection,
}

impl DatabaseClaimStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates the marker tables when they are missing.
    pub async fn ensure_schema(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut markers = schema.create_table_from_entity(marker::Entity);
        markers.if_not_exists();
        self.db.execute(backend.build(&markers)).await?;

        let mut claims = schema.create_table_from_entity(marker_claim::Entity);
        claims.if_not_exists();
        self.db.execute(backend.build(&claims)).await?;
        Ok(())
    }
}

impl From<marker::Model> for Marker {
    fn from(model: marker::Model) -> Self {
        Marker {
            id: model.id,
            title: model.title,
            position: Coordinates::new(model.lat, model.lng),
            active: model.active,
            visible_from: model.visible_from.map(|t| t.with_timezone(&Utc)),
            visible_to: model.visible_to.map(|t| t.with_timezone(&Utc)),
            radius_m: model.radius_m,
            reward: Reward {
                kind: model.reward_type,
                amount: model.reward_amount,
                data: model.reward_data,
            },
            next_route: model.next_route,
        }
    }
}

#[async_trait::async_trait]
impl ClaimStore for DatabaseClaimStore {
    async fn find_marker(&self, marker_id: &str) -> StoreResult<Option<Marker>> {
        let model = marker::Entity::find_by_id(marker_id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Marker::from))
    }

    async fn claim_exists(&self, marker_id: &str, user_id: &str) -> StoreResult<bool> {
        let count = marker_claim::Entity::find()
            .filter(marker_claim::Column::MarkerId.eq(marker_id))
            .filter(marker_claim::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert_claim(&self, claim: Claim) -> StoreResult<ClaimInsert> {
        let model = marker_claim::ActiveModel {
            marker_id: Set(claim.marker_id.clone()),
            user_id: Set(claim.user_id.clone()),
            receipt_id: Set(claim.receipt_id.clone()),
            reward_type: Set(claim.reward_type.clone()),
            reward_data: Set(claim.reward_data.clone()),
            created_at: Set(claim.created_at.fixed_offset()),
        };

        let result = marker_claim::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    marker_claim::Column::MarkerId,
                    marker_claim::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(0) => Ok(ClaimInsert::Duplicate),
            Ok(_) => Ok(ClaimInsert::Inserted(claim)),
            // backends without ON CONFLICT support surface the raw violation
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(ClaimInsert::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use m1ssion_types::Value;
    use m1ssion_types::create_id;
    use sea_orm::{ConnectOptions, Database};
    use std::sync::Arc;
    use tokio::sync::Barrier;

    async fn sqlite_store() -> DatabaseClaimStore {
        // a single connection keeps every query on the same in-memory database
        connect("sqlite::memory:", 1).await
    }

    async fn connect(url: &str, max_connections: u32) -> DatabaseClaimStore {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        let store = DatabaseClaimStore::new(db);
        store.ensure_schema().await.unwrap();
        // twice is a no-op
        store.ensure_schema().await.unwrap();

        let now = Utc::now().fixed_offset();
        marker::Entity::insert(marker::ActiveModel {
            id: Set("trevi".into()),
            title: Set("Fontana di Trevi".into()),
            lat: Set(41.9009),
            lng: Set(12.4833),
            active: Set(true),
            visible_from: Set(Some(now - chrono::Duration::hours(1))),
            visible_to: Set(None),
            radius_m: Set(Some(50.0)),
            reward_type: Set("m1u".into()),
            reward_amount: Set(25),
            reward_data: Set(serde_json::json!({ "badge": "fountain" })),
            next_route: Set(Some("/wallet".into())),
        })
        .exec_without_returning(store.connection())
        .await
        .unwrap();

        store
    }

    fn claim(user_id: &str) -> Claim {
        Claim {
            marker_id: "trevi".into(),
            user_id: user_id.into(),
            receipt_id: create_id(),
            reward_type: "m1u".into(),
            reward_data: Value::Null,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn maps_marker_rows() {
        let store = sqlite_store().await;

        let marker = store.find_marker("trevi").await.unwrap().unwrap();
        assert_eq!(marker.position, Coordinates::new(41.9009, 12.4833));
        assert_eq!(marker.radius_m, Some(50.0));
        assert_eq!(marker.reward.amount, 25);
        assert_eq!(marker.reward.data["badge"], "fountain");
        assert_eq!(marker.next_route.as_deref(), Some("/wallet"));
        assert!(marker.visible_from.is_some());

        assert!(store.find_marker("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_insert_for_the_same_pair_is_a_duplicate() {
        let store = sqlite_store().await;

        assert!(!store.claim_exists("trevi", "agent-1").await.unwrap());
        assert!(matches!(
            store.insert_claim(claim("agent-1")).await.unwrap(),
            ClaimInsert::Inserted(_)
        ));
        assert!(store.claim_exists("trevi", "agent-1").await.unwrap());

        // bypasses any pre-check: the constraint alone must reject it
        assert_eq!(
            store.insert_claim(claim("agent-1")).await.unwrap(),
            ClaimInsert::Duplicate
        );

        assert!(matches!(
            store.insert_claim(claim("agent-2")).await.unwrap(),
            ClaimInsert::Inserted(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_produce_one_claim() {
        const ATTEMPTS: usize = 8;
        // a file database so every attempt gets its own connection
        let path = std::env::temp_dir().join(format!("m1ssion-claims-{}.db", create_id()));
        let store = Arc::new(
            connect(&format!("sqlite://{}?mode=rwc", path.display()), ATTEMPTS as u32).await,
        );
        let start = Arc::new(Barrier::new(ATTEMPTS));

        let attempts = (0..ATTEMPTS).map(|_| {
            let store = store.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                store.insert_claim(claim("agent-7")).await
            })
        });
        let results = futures::future::join_all(attempts).await;

        let inserted = results
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .filter(|r| matches!(r, ClaimInsert::Inserted(_)))
            .count();
        assert_eq!(inserted, 1);

        let rows = marker_claim::Entity::find()
            .count(store.connection())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let _ = std::fs::remove_file(&path);
    }
}
