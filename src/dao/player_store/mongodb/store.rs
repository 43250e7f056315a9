use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoLeaderboardRow, MongoPlayerDocument},
};
use crate::dao::{
    models::{LeaderboardEntryEntity, PlayerEntity},
    player_store::PlayerStore,
    storage::StorageResult,
};

const PLAYER_COLLECTION_NAME: &str = "players";

#[derive(Clone)]
pub struct MongoPlayerStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
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
        let (client, database) = open_database(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPlayerStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = open_database(&config).await?;

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
        let index = IndexModel::builder()
            .keys(doc! {"student_name": 1, "college_name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_identity_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "student_name,college_name",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoPlayerDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn register(&self, student_name: String, college_name: String) -> MongoResult<PlayerEntity> {
        let collection = self.collection().await;
        let filter = doc! { "student_name": student_name.as_str(), "college_name": college_name.as_str() };
        let update = doc! {
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "scores": [],
                "created_at": DateTime::now(),
            }
        };

        let upserted = collection
            .find_one_and_update(filter.clone(), update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        let document = match upserted {
            Ok(document) => document,
            // Two concurrent upserts for the same identity: the loser reads the winner's row.
            Err(err) if is_duplicate_key(&err) => {
                debug!(%student_name, %college_name, "concurrent registration; reloading player");
                collection.find_one(filter).await.map_err(|source| {
                    MongoDaoError::RegisterPlayer {
                        student_name: student_name.clone(),
                        college_name: college_name.clone(),
                        source,
                    }
                })?
            }
            Err(source) => {
                return Err(MongoDaoError::RegisterPlayer {
                    student_name,
                    college_name,
                    source,
                });
            }
        };

        match document {
            Some(document) => PlayerEntity::try_from(document),
            None => Err(MongoDaoError::MissingUpsert {
                student_name,
                college_name,
            }),
        }
    }

    async fn record_score(&self, id: Uuid, value: u32) -> MongoResult<bool> {
        let collection = self.collection().await;
        let result = collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! {
                    "$push": {
                        "scores": { "value": i64::from(value), "recorded_at": DateTime::now() }
                    }
                },
            )
            .await
            .map_err(|source| MongoDaoError::RecordScore { id, source })?;

        Ok(result.matched_count > 0)
    }

    async fn find_player(&self, id: Uuid) -> MongoResult<Option<PlayerEntity>> {
        let collection = self.collection().await;
        collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::LoadPlayer { id, source })?
            .map(PlayerEntity::try_from)
            .transpose()
    }

    async fn leaderboard(&self, limit: usize) -> MongoResult<Vec<LeaderboardEntryEntity>> {
        let collection = self.collection().await;
        let pipeline = leaderboard_pipeline(limit);

        let rows: Vec<MongoLeaderboardRow> = collection
            .aggregate(pipeline)
            .with_type::<MongoLeaderboardRow>()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?;

        rows.into_iter()
            .map(LeaderboardEntryEntity::try_from)
            .collect()
    }
}

impl PlayerStore for MongoPlayerStore {
    fn register(
        &self,
        student_name: String,
        college_name: String,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .register(student_name, college_name)
                .await
                .map_err(Into::into)
        })
    }

    fn record_score(&self, id: Uuid, value: u32) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.record_score(id, value).await.map_err(Into::into) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player(id).await.map_err(Into::into) })
    }

    fn leaderboard(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.leaderboard(limit).await.map_err(Into::into) })
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

/// Aggregation ranking players by best score, earliest achievement first among equals.
fn leaderboard_pipeline(limit: usize) -> Vec<Document> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    vec![
        doc! { "$unwind": "$scores" },
        // Highest value first, earliest submission first among equal values, so that
        // `$first` below picks when the best score was reached.
        doc! { "$sort": { "scores.value": -1, "scores.recorded_at": 1 } },
        doc! {
            "$group": {
                "_id": "$_id",
                "student_name": { "$first": "$student_name" },
                "college_name": { "$first": "$college_name" },
                "best_score": { "$first": "$scores.value" },
                "achieved_at": { "$first": "$scores.recorded_at" },
            }
        },
        doc! { "$sort": { "best_score": -1, "achieved_at": 1, "_id": 1 } },
        doc! { "$limit": limit },
    ]
}
