use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{PlayerEntity, ScoreEntryEntity},
    dto::{
        format_system_time,
        validation::{missing_field, validate_identity_field},
    },
};

/// Identity supplied on `/api/login` and `/api/register`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Student name; matched case-insensitively.
    #[serde(default, alias = "name")]
    pub student_name: Option<String>,
    /// College name; matched case-insensitively.
    #[serde(default, alias = "college")]
    pub college_name: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [
            ("studentName", &self.student_name),
            ("collegeName", &self.college_name),
        ] {
            match value {
                Some(value) => {
                    if let Err(e) = validate_identity_field(value) {
                        errors.add(field, e);
                    }
                }
                None => errors.add(field, missing_field()),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Registered player returned after login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub student_name: String,
    pub college_name: String,
}

impl From<PlayerEntity> for RegisterResponse {
    fn from(player: PlayerEntity) -> Self {
        Self {
            success: true,
            user_id: player.id,
            student_name: player.student_name,
            college_name: player.college_name,
        }
    }
}

/// Final score submitted at the end of a play-through.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub score: Option<u32>,
}

impl Validate for ScoreRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.user_id.is_none() {
            errors.add("userId", missing_field());
        }
        if self.score.is_none() {
            errors.add("score", missing_field());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// One entry of a player's score history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntryResponse {
    pub value: u32,
    /// RFC 3339 submission time.
    pub recorded_at: String,
}

impl From<ScoreEntryEntity> for ScoreEntryResponse {
    fn from(entry: ScoreEntryEntity) -> Self {
        Self {
            value: entry.value,
            recorded_at: format_system_time(entry.recorded_at),
        }
    }
}

/// Stored player record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: Uuid,
    pub student_name: String,
    pub college_name: String,
    pub created_at: String,
    pub best_score: Option<u32>,
    pub scores: Vec<ScoreEntryResponse>,
}

impl From<PlayerEntity> for PlayerProfile {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            best_score: player.best_score().map(|(value, _)| value),
            student_name: player.student_name,
            college_name: player.college_name,
            created_at: format_system_time(player.created_at),
            scores: player.scores.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_accepts_short_aliases() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"name": "Alice", "college": "X"}"#).unwrap();
        assert_eq!(request.student_name.as_deref(), Some("Alice"));
        assert_eq!(request.college_name.as_deref(), Some("X"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn register_request_reports_every_missing_field() {
        let request: RegisterRequest = serde_json::from_str(r#"{"studentName": " "}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("studentName"));
        assert!(fields.contains_key("collegeName"));
    }

    #[test]
    fn score_request_requires_both_fields() {
        let request: ScoreRequest = serde_json::from_str(r#"{"score": 30}"#).unwrap();
        assert!(request.validate().is_err());

        let request = ScoreRequest {
            user_id: Some(Uuid::new_v4()),
            score: Some(0),
        };
        assert!(request.validate().is_ok());
    }
}
