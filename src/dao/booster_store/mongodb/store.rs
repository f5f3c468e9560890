use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    connection::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{CounterDocument, MongoBoosterDocument, doc_id, live_filter, non_expired_filter},
};
use crate::dao::{
    booster_store::BoosterStore,
    models::{BoosterEntity, BoosterId, NewBoosterEntity},
    storage::StorageResult,
};

const BOOSTER_COLLECTION_NAME: &str = "boosters";
const COUNTER_COLLECTION_NAME: &str = "counters";
const BOOSTER_COUNTER_ID: &str = "booster_id";

/// MongoDB-backed [`BoosterStore`].
#[derive(Clone)]
pub struct MongoBoosterStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBoosterStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;

        let player_index = mongodb::IndexModel::builder()
            .keys(doc! {"player_key": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("booster_player_idx".to_owned()))
                    .build(),
            )
            .build();
        collection
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: BOOSTER_COLLECTION_NAME,
                index: "player_key",
                source,
            })?;

        let scope_index = mongodb::IndexModel::builder()
            .keys(doc! {"scope": 1, "activated_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("booster_scope_activation_idx".to_owned()))
                    .build(),
            )
            .build();
        collection
            .create_index(scope_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: BOOSTER_COLLECTION_NAME,
                index: "scope,activated_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<MongoBoosterDocument> {
        self.database()
            .await
            .collection::<MongoBoosterDocument>(BOOSTER_COLLECTION_NAME)
    }

    /// Atomically bump the shared counter to emulate an auto-increment key.
    async fn next_id(&self) -> MongoResult<BoosterId> {
        let counters = self
            .database()
            .await
            .collection::<CounterDocument>(COUNTER_COLLECTION_NAME);

        let counter = counters
            .find_one_and_update(
                doc! {"_id": BOOSTER_COUNTER_ID},
                doc! {"$inc": {"seq": 1_i64}},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::AllocateId { source })?
            .ok_or(MongoDaoError::MissingCounter)?;
        Ok(counter.seq)
    }

    async fn create_booster(&self, booster: NewBoosterEntity) -> MongoResult<BoosterId> {
        let id = self.next_id().await?;
        let player = booster.player.clone();
        let document = MongoBoosterDocument::pending(id, booster);

        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertBooster { player, source })?;
        Ok(id)
    }

    async fn find_booster(&self, id: BoosterId) -> MongoResult<Option<BoosterEntity>> {
        let document = self
            .collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadBooster { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn non_expired_boosters(
        &self,
        player: String,
        now: i64,
    ) -> MongoResult<Vec<BoosterEntity>> {
        let collection = self.collection().await;
        let documents: Vec<MongoBoosterDocument> = collection
            .find(non_expired_filter(&player, now))
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListPlayerBoosters {
                player: player.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListPlayerBoosters { player, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn active_boosters(
        &self,
        scope: Option<String>,
        now: i64,
    ) -> MongoResult<Vec<BoosterEntity>> {
        let mut filter = live_filter(now);
        if let Some(scope) = scope {
            filter.insert("scope", scope);
        }

        let documents: Vec<MongoBoosterDocument> = self
            .collection()
            .await
            .find(filter)
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListActiveBoosters { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListActiveBoosters { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn mark_activated(&self, id: BoosterId, at: i64) -> MongoResult<()> {
        self.collection()
            .await
            .update_one(doc_id(id), doc! {"$set": {"activated_at": at}})
            .await
            .map_err(|source| MongoDaoError::MarkActivated { id, source })?;
        Ok(())
    }
}

impl BoosterStore for MongoBoosterStore {
    fn create_booster(
        &self,
        booster: NewBoosterEntity,
    ) -> BoxFuture<'static, StorageResult<BoosterId>> {
        let store = self.clone();
        Box::pin(async move { store.create_booster(booster).await.map_err(Into::into) })
    }

    fn find_booster(
        &self,
        id: BoosterId,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_booster(id).await.map_err(Into::into) })
    }

    fn non_expired_boosters(
        &self,
        owner: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>> {
        let store = self.clone();
        let owner = owner.to_owned();
        Box::pin(async move {
            store
                .non_expired_boosters(owner, now)
                .await
                .map_err(Into::into)
        })
    }

    fn active_booster_for(
        &self,
        scope: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>> {
        let store = self.clone();
        let scope = scope.to_owned();
        Box::pin(async move {
            let rows = store.active_boosters(Some(scope), now).await?;
            Ok(rows.into_iter().next())
        })
    }

    fn all_active_boosters(
        &self,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.active_boosters(None, now).await.map_err(Into::into) })
    }

    fn mark_activated(&self, id: BoosterId, at: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.mark_activated(id, at).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
