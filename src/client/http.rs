use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use super::error::{ClientError, ClientResult, RegistrationError};
use crate::{
    dto::{
        leaderboard::LeaderboardEntryResponse,
        player::{RegisterResponse, ScoreRequest},
        question::QuestionResponse,
    },
    state::{
        persistence::{LeaderboardEntry, PersistenceError, ScoreService},
        question::QuestionItem,
    },
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    student_name: &'a str,
    college_name: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Thin client over the backend REST API.
#[derive(Clone)]
pub struct HttpScoreClient {
    client: Client,
    base_url: Arc<str>,
}

impl HttpScoreClient {
    /// Client for the backend listening at `base_url` (for instance `http://localhost:3000`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ClientError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    /// Register the player, or retrieve the existing record for the same identity.
    pub async fn register(
        &self,
        student_name: &str,
        college_name: &str,
    ) -> Result<RegisterResponse, RegistrationError> {
        if student_name.trim().is_empty() {
            return Err(RegistrationError::MissingField("studentName"));
        }
        if college_name.trim().is_empty() {
            return Err(RegistrationError::MissingField("collegeName"));
        }

        let body = LoginBody {
            student_name,
            college_name,
        };
        Ok(self.send_json(Method::POST, "api/login", Some(&body)).await?)
    }

    /// Append a final score to the player's history.
    pub async fn submit_score(&self, user_id: Uuid, score: u32) -> ClientResult<()> {
        let body = ScoreRequest {
            user_id: Some(user_id),
            score: Some(score),
        };
        let _: serde_json::Value = self.send_json(Method::POST, "api/score", Some(&body)).await?;
        Ok(())
    }

    /// Top players by best score.
    pub async fn leaderboard(&self) -> ClientResult<Vec<LeaderboardEntryResponse>> {
        self.send_json::<(), _>(Method::GET, "api/leaderboard", None)
            .await
    }

    /// Question bank configured on the backend.
    pub async fn questions(&self) -> ClientResult<Vec<QuestionItem>> {
        let items: Vec<QuestionResponse> = self
            .send_json::<(), _>(Method::GET, "api/questions", None)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(path, %status, "backend responded");
        if !status.is_success() {
            return Err(ClientError::RequestStatus {
                path: path.to_string(),
                status,
                message: error_message(response).await,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text)
}

impl ScoreService for HttpScoreClient {
    fn record_score(
        &self,
        player_id: Uuid,
        score: u32,
    ) -> BoxFuture<'static, Result<(), PersistenceError>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .submit_score(player_id, score)
                .await
                .map_err(|err| match err.status() {
                    Some(StatusCode::NOT_FOUND) => PersistenceError::UnknownPlayer(player_id),
                    _ => err.into(),
                })
        })
    }

    fn leaderboard(&self) -> BoxFuture<'static, Result<Vec<LeaderboardEntry>, PersistenceError>> {
        let client = self.clone();
        Box::pin(async move {
            let rows = HttpScoreClient::leaderboard(&client).await?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }
}
