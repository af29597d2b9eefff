use serde_json::Value;

use super::{ApiClient, ApiError, ClassFilters};
use crate::model::Class;

pub async fn list(client: &ApiClient, filters: &ClassFilters) -> Result<Vec<Class>, ApiError> {
    client.get_json("classes", &filters.to_query()).await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Class, ApiError> {
    client.get_json(&format!("classes/{id}"), &[]).await
}

pub async fn create(client: &ApiClient, payload: &Value) -> Result<Class, ApiError> {
    client.post_json("classes", payload).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<Class, ApiError> {
    client.put_json(&format!("classes/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("classes/{id}")).await
}
