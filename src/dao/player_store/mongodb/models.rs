use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{LeaderboardEntryEntity, PlayerEntity, ScoreEntryEntity};

/// Player document. Ids are stored as their hyphenated string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_name: String,
    pub college_name: String,
    #[serde(default)]
    pub scores: Vec<MongoScoreDocument>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    pub value: i64,
    pub recorded_at: DateTime,
}

/// Shape of one row produced by the leaderboard pipeline.
#[derive(Debug, Deserialize)]
pub struct MongoLeaderboardRow {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_name: String,
    pub college_name: String,
    pub best_score: i64,
    pub achieved_at: DateTime,
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            student_name: value.student_name,
            college_name: value.college_name,
            scores: value
                .scores
                .into_iter()
                .map(|score| ScoreEntryEntity {
                    value: clamp_score(score.value),
                    recorded_at: score.recorded_at.to_system_time(),
                })
                .collect(),
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl TryFrom<MongoLeaderboardRow> for LeaderboardEntryEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoLeaderboardRow) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_id(&value.id)?,
            student_name: value.student_name,
            college_name: value.college_name,
            best_score: clamp_score(value.best_score),
            achieved_at: value.achieved_at.to_system_time(),
        })
    }
}

fn parse_id(raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|source| MongoDaoError::CorruptPlayerId {
        id: raw.to_owned(),
        source,
    })
}

fn clamp_score(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use mongodb::bson::{deserialize_from_document, doc};

    use super::*;

    #[test]
    fn pipeline_row_becomes_leaderboard_entry() {
        let id = Uuid::new_v4();
        let row: MongoLeaderboardRow = deserialize_from_document(doc! {
            "_id": id.to_string(),
            "student_name": "alice",
            "college_name": "bis",
            "best_score": 20_i64,
            "achieved_at": DateTime::from_millis(1_700_000_000_000),
        })
        .unwrap();

        let entry = LeaderboardEntryEntity::try_from(row).unwrap();
        assert_eq!(entry.player_id, id);
        assert_eq!(entry.student_name, "alice");
        assert_eq!(entry.college_name, "bis");
        assert_eq!(entry.best_score, 20);
        assert_eq!(
            entry.achieved_at,
            UNIX_EPOCH + Duration::from_millis(1_700_000_000_000)
        );
    }

    #[test]
    fn row_with_foreign_id_is_rejected() {
        let row = MongoLeaderboardRow {
            id: "not-a-uuid".into(),
            student_name: "bob".into(),
            college_name: "bis".into(),
            best_score: 5,
            achieved_at: DateTime::now(),
        };
        assert!(matches!(
            LeaderboardEntryEntity::try_from(row),
            Err(MongoDaoError::CorruptPlayerId { .. })
        ));
    }

    #[test]
    fn stored_player_without_scores_loads() {
        let id = Uuid::new_v4();
        let document: MongoPlayerDocument = deserialize_from_document(doc! {
            "_id": id.to_string(),
            "student_name": "carol",
            "college_name": "bis",
            "created_at": DateTime::now(),
        })
        .unwrap();

        let player = PlayerEntity::try_from(document).unwrap();
        assert_eq!(player.id, id);
        assert!(player.scores.is_empty());
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        assert_eq!(clamp_score(-3), 0);
        assert_eq!(clamp_score(i64::from(u32::MAX) + 1), u32::MAX);
    }
}
