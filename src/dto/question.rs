use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::question::QuestionItem;

/// Trivia item of the configured bank.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl From<&QuestionItem> for QuestionResponse {
    fn from(item: &QuestionItem) -> Self {
        Self {
            text: item.text.clone(),
            options: item.options.clone(),
            correct_index: item.correct_index,
        }
    }
}

impl From<QuestionResponse> for QuestionItem {
    fn from(item: QuestionResponse) -> Self {
        QuestionItem::new(item.text, item.options, item.correct_index)
    }
}
