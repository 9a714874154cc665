use crate::{api::AppState, auth::AuthError};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserLogin {
    username: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginToken {
    token: String,
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = LoginToken, content_type = "application/json"),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag= "auth"
)]
// axum handler for login
#[instrument(skip(state, payload))]
pub async fn login(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<UserLogin>>,
) -> Result<Json<LoginToken>, AuthError> {
    let Some(Json(user)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let token = state.gate.login(&user.username, &user.password).await?;

    Ok(Json(LoginToken { token }))
}
