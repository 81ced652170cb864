use std::time::Duration;

use async_trait::async_trait;
use flowboard_core::{Board, BoardSummary, Card, CardMove, List};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ApiError, BoardApi};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Message of an error response: the JSON `message` (or `error`) field,
/// else the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(body)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Body of `PATCH /cards/{id}/move`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveBody<'a> {
    source_list_id: &'a str,
    destination_list_id: &'a str,
    destination_index: usize,
}

impl<'a> From<&'a CardMove> for MoveBody<'a> {
    fn from(mv: &'a CardMove) -> Self {
        Self {
            source_list_id: &mv.source_list_id,
            destination_list_id: &mv.destination_list_id,
            destination_index: mv.destination_index,
        }
    }
}

#[derive(Deserialize)]
struct SubtasksBody {
    subtasks: String,
}

/// `BoardApi` over the backend's REST endpoints.
pub struct HttpBoardApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBoardApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(text),
        })
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let resp = Self::check(resp).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self, board_id: &str) -> Result<Board, ApiError> {
        let resp = self
            .client
            .get(self.url(&format!("/boards/{}", segment(board_id))))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>, ApiError> {
        let resp = self.client.get(self.url("/boards")).send().await?;
        Self::decode(resp).await
    }

    async fn create_board(&self, title: &str) -> Result<BoardSummary, ApiError> {
        let resp = self
            .client
            .post(self.url("/boards"))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("/boards/{}", segment(board_id))))
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ApiError> {
        let resp = self
            .client
            .post(self.url("/cards"))
            .json(&serde_json::json!({ "listId": list_id, "title": title }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("/cards/{}", segment(card_id))))
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn move_card(&self, mv: &CardMove) -> Result<(), ApiError> {
        let resp = self
            .client
            .patch(self.url(&format!("/cards/{}/move", segment(&mv.card_id))))
            .json(&MoveBody::from(mv))
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ApiError> {
        let resp = self
            .client
            .post(self.url("/lists"))
            .json(&serde_json::json!({ "boardId": board_id, "title": title }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn update_list_title(&self, list_id: &str, title: &str) -> Result<List, ApiError> {
        let resp = self
            .client
            .patch(self.url(&format!("/lists/{}", segment(list_id))))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete_list(&self, list_id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("/lists/{}", segment(list_id))))
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn reorder_lists(&self, board_id: &str, ordered_list_ids: &[String]) -> Result<(), ApiError> {
        let resp = self
            .client
            .patch(self.url(&format!("/boards/{}/reorder-lists", segment(board_id))))
            .json(&serde_json::json!({ "orderedListIds": ordered_list_ids }))
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn generate_subtasks(&self, title: &str) -> Result<String, ApiError> {
        let resp = self
            .client
            .post(self.url("/ai/generate-subtasks"))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;
        let body: SubtasksBody = Self::decode(resp).await?;
        Ok(body.subtasks)
    }
}
