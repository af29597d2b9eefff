use serde_json::Value;

use super::{ApiClient, ApiError, CommentFilters};
use crate::model::Comment;

pub async fn list(client: &ApiClient, filters: &CommentFilters) -> Result<Vec<Comment>, ApiError> {
    client.get_json("comments", &filters.to_query()).await
}

pub async fn create(client: &ApiClient, payload: &Value) -> Result<Comment, ApiError> {
    client.post_json("comments", payload).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<Comment, ApiError> {
    client.put_json(&format!("comments/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("comments/{id}")).await
}
