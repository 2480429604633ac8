use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, ChangePasswordRequest, LoginRequest, SignupRequest},
        extractors::CallerId,
        services::{check_new_password, require_fields},
    },
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{MessageResponse, PublicUser},
        repo::NewUser,
        repo_types::User,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    require_fields(&[
        ("fullName", payload.full_name.as_str()),
        ("email", payload.email.as_str()),
        ("password", payload.password.as_str()),
        ("mobileNumber", payload.mobile_number.as_str()),
        ("countryCode", payload.country_code.as_str()),
    ])?;
    check_new_password(&payload.password)?;

    let user = User::create(
        &state.store,
        NewUser {
            full_name: payload.full_name,
            email: payload.email,
            password: payload.password,
            mobile_number: payload.mobile_number,
            country_code: payload.country_code,
        },
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "signup rejected");
        e
    })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Signup successful".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    require_fields(&[
        ("email", payload.email.as_str()),
        ("password", payload.password.as_str()),
    ])?;

    let user = User::authenticate(&state.store, &payload.email, &payload.password).await?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        user: PublicUser::from(user),
    }))
}

/// Self-service password change for the caller named in `x-user-id`.
#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    require_fields(&[
        ("oldPassword", payload.old_password.as_str()),
        ("newPassword", payload.new_password.as_str()),
    ])?;
    check_new_password(&payload.new_password)?;
    if payload.old_password == payload.new_password {
        return Err(AppError::validation(
            "New password must be different from the current password",
        ));
    }

    if !User::verify_password(&state.store, user_id, &payload.old_password).await? {
        warn!(user_id, "change password with wrong current password");
        return Err(AppError::Auth(crate::error::AuthFailure::InvalidCredentials));
    }

    User::change_password(&state.store, user_id, &payload.new_password).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
