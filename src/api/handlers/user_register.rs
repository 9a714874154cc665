use crate::{
    api::AppState,
    auth::{AuthError, UserId},
};
use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserRegister {
    username: String,
    password: String,
}

// never print the password
impl std::fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Registered {
    message: String,
    #[schema(value_type = u64)]
    user_id: UserId,
    username: String,
}

#[utoipa::path(
    post,
    path= "/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Registration successful", body = Registered, content_type = "application/json"),
        (status = 400, description = "Missing fields, malformed body or username already taken"),
    ),
    tag= "auth"
)]
// axum handler for register
#[instrument(skip(state, payload))]
pub async fn register(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<UserRegister>>,
) -> Result<(StatusCode, Json<Registered>), AuthError> {
    let Some(Json(user)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    debug!("user: {:?}", user);

    let identity = state.gate.register(&user.username, &user.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            message: "User registered successfully".to_string(),
            user_id: identity.user_id(),
            username: identity.username().to_string(),
        }),
    ))
}
