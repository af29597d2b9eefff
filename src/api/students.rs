use serde_json::Value;

use super::{ApiClient, ApiError, StudentFilters};
use crate::model::Student;

pub async fn list(client: &ApiClient, filters: &StudentFilters) -> Result<Vec<Student>, ApiError> {
    client.get_json("students", &filters.to_query()).await
}

pub async fn create(client: &ApiClient, payload: &Value) -> Result<Student, ApiError> {
    client.post_json("students", payload).await
}

pub async fn update(client: &ApiClient, id: &str, payload: &Value) -> Result<Student, ApiError> {
    client.put_json(&format!("students/{id}"), payload).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("students/{id}")).await
}
