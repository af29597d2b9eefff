use serde_json::Value;

use super::{ApiClient, ApiError};
use crate::model::School;

pub async fn list(client: &ApiClient) -> Result<Vec<School>, ApiError> {
    client.get_json("schools", &[]).await
}

pub async fn create(client: &ApiClient, payload: &Value) -> Result<School, ApiError> {
    client.post_json("schools", payload).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<School, ApiError> {
    client.put_json(&format!("schools/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("schools/{id}")).await
}
