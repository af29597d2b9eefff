use serde_json::Value;

use super::{ApiClient, ApiError, UserFilters};
use crate::model::User;

pub async fn list(client: &ApiClient, filters: &UserFilters) -> Result<Vec<User>, ApiError> {
    client.get_json("users", &filters.to_query()).await
}

pub async fn create(client: &ApiClient, payload: &Value) -> Result<User, ApiError> {
    client.post_json("users", payload).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<User, ApiError> {
    client.put_json(&format!("users/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("users/{id}")).await
}
