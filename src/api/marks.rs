use serde_json::Value;

use super::{ApiClient, ApiError, MarksFilters};
use crate::model::{Mark, NewMark};

pub async fn list(client: &ApiClient, filters: &MarksFilters) -> Result<Vec<Mark>, ApiError> {
    client.get_json("marks", &filters.to_query()).await
}

/// The marks bulk endpoint takes a bare array, unlike attendance's wrapped
/// `{"records": [...]}`. The asymmetry is the backend's observed contract.
pub async fn bulk_create(client: &ApiClient, marks: &[NewMark]) -> Result<Vec<Mark>, ApiError> {
    let body =
        serde_json::to_value(marks).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    client.post_json("marks/bulk", &body).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<Mark, ApiError> {
    client.put_json(&format!("marks/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("marks/{id}")).await
}
