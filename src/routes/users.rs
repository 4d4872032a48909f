use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::store;

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_user))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    name: String,
    icon: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: Uuid,
    name: String,
    icon: Option<String>,
    created_at: String,
}

/// `POST /users` — Create a new user identity.
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() || name.len() > 100 {
        return Err(AppError::Validation(
            "Name must be between 1 and 100 characters.".to_string(),
        ));
    }

    let user = store::create_user(&state.db, name, body.icon).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            name: user.name,
            icon: user.icon,
            created_at: user.created_at.to_rfc3339(),
        }),
    ))
}
