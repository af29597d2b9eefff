use serde_json::json;

use super::{ApiClient, ApiError};
use crate::model::LoginResponse;

pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    client
        .post_json("auth/login", &json!({ "email": email, "password": password }))
        .await
}
