use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::services::check_new_password,
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{MessageResponse, PublicUser, ResetPasswordRequest, TestimonialPermission},
        repo_types::{User, UserPatch},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:id", get(get_user))
        .route("/users", get(list_users))
        .route("/users/:id", axum::routing::patch(update_user).delete(delete_user))
        .route("/users/:id/toggle-testimonial", post(toggle_testimonial))
        .route("/users/:id/suspend", post(suspend_user))
        .route("/users/:id/unsuspend", post(unsuspend_user))
        .route("/users/:id/reset-password", post(reset_password))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.store, id)
        .await
        .ok_or(AppError::NotFound { entity: "user", id })?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<PublicUser>> {
    let users = User::list(&state.store).await;
    Json(users.into_iter().map(PublicUser::from).collect())
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserPatch>,
) -> AppResult<Json<PublicUser>> {
    if payload.is_empty() {
        return Err(AppError::validation("No fields to update"));
    }
    let user = User::update(&state.store, id, payload).await?;
    info!(user_id = id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn toggle_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TestimonialPermission>> {
    let testimonial_allowed = User::toggle_testimonial(&state.store, id).await?;
    info!(user_id = id, testimonial_allowed, "testimonial permission toggled");
    Ok(Json(TestimonialPermission { testimonial_allowed }))
}

#[instrument(skip(state))]
pub async fn suspend_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    User::set_suspended(&state.store, id, true).await?;
    Ok(Json(MessageResponse::new("User suspended")))
}

#[instrument(skip(state))]
pub async fn unsuspend_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    User::set_suspended(&state.store, id, false).await?;
    Ok(Json(MessageResponse::new("User unsuspended")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    User::delete(&state.store, id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    check_new_password(&payload.password)?;
    User::change_password(&state.store, id, &payload.password).await?;
    info!(user_id = id, "password reset by administrator");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
