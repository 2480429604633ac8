use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::services::require_fields,
    error::AppResult,
    state::AppState,
    testimonials::{
        dto::{CreateTestimonialRequest, VisibilityResponse},
        repo_types::{Testimonial, TestimonialEntry},
    },
    users::dto::MessageResponse,
};

pub fn testimonial_routes() -> Router<AppState> {
    Router::new()
        .route("/testimonials", get(list_visible).post(create_testimonial))
        .route("/testimonials/all", get(list_all))
        .route(
            "/testimonials/:id/toggle-visibility",
            post(toggle_visibility),
        )
        .route("/testimonials/:id", delete(delete_testimonial))
}

/// Name and email are copied from the submitting user, who must be allowed
/// to post testimonials.
#[instrument(skip(state, payload))]
pub async fn create_testimonial(
    State(state): State<AppState>,
    Json(payload): Json<CreateTestimonialRequest>,
) -> AppResult<(StatusCode, Json<Testimonial>)> {
    require_fields(&[
        ("tripName", payload.trip_name.as_str()),
        ("quote", payload.quote.as_str()),
    ])?;

    let t = Testimonial::submit(
        &state.store,
        payload.user_id,
        TestimonialEntry {
            trip_name: payload.trip_name,
            quote: payload.quote,
            rating: payload.rating,
            role: payload.role,
            location: payload.location,
            highlight: payload.highlight,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(t)))
}

#[instrument(skip(state))]
pub async fn list_visible(State(state): State<AppState>) -> Json<Vec<Testimonial>> {
    Json(Testimonial::list_visible(&state.store).await)
}

#[instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> Json<Vec<Testimonial>> {
    Json(Testimonial::list_all(&state.store).await)
}

#[instrument(skip(state))]
pub async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<VisibilityResponse>> {
    let is_visible = Testimonial::toggle_visibility(&state.store, id).await?;
    Ok(Json(VisibilityResponse { is_visible }))
}

#[instrument(skip(state))]
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    Testimonial::delete(&state.store, id).await?;
    Ok(Json(MessageResponse::new("Testimonial deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{repo::NewUser, repo_types::User};

    async fn member(state: &AppState, allowed: bool) -> User {
        let user = User::create(
            &state.store,
            NewUser {
                full_name: "Meera Iyer".into(),
                email: "meera@x.com".into(),
                password: "secret1".into(),
                mobile_number: "4445556666".into(),
                country_code: "IN".into(),
            },
        )
        .await
        .unwrap();
        if allowed {
            User::toggle_testimonial(&state.store, user.id).await.unwrap();
        }
        user
    }

    fn body(user_id: i64, rating: i32) -> CreateTestimonialRequest {
        CreateTestimonialRequest {
            user_id,
            trip_name: "Kashmir".into(),
            quote: "Snow and silence".into(),
            rating,
            role: None,
            location: Some("Chennai".into()),
            highlight: Some("Gulmarg".into()),
        }
    }

    #[tokio::test]
    async fn allowed_user_submits_with_copied_identity() {
        let state = AppState::fake().await;
        let user = member(&state, true).await;
        let (status, Json(t)) = create_testimonial(State(state.clone()), Json(body(user.id, 5)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(t.user_name, "Meera Iyer");
        assert_eq!(t.email, "meera@x.com");

        let Json(public) = list_visible(State(state)).await;
        assert_eq!(public.len(), 1);
    }

    #[tokio::test]
    async fn not_allowed_or_bad_rating_is_rejected() {
        let state = AppState::fake().await;
        let user = member(&state, false).await;
        let err = create_testimonial(State(state.clone()), Json(body(user.id, 5)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        User::toggle_testimonial(&state.store, user.id).await.unwrap();
        let err = create_testimonial(State(state.clone()), Json(body(user.id, 9)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = create_testimonial(State(state), Json(body(999, 5)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hide_then_delete() {
        let state = AppState::fake().await;
        let user = member(&state, true).await;
        let (_, Json(t)) = create_testimonial(State(state.clone()), Json(body(user.id, 4)))
            .await
            .unwrap();

        let Json(v) = toggle_visibility(State(state.clone()), Path(t.id)).await.unwrap();
        assert!(!v.is_visible);
        let Json(public) = list_visible(State(state.clone())).await;
        assert!(public.is_empty());
        let Json(all) = list_all(State(state.clone())).await;
        assert_eq!(all.len(), 1);

        delete_testimonial(State(state.clone()), Path(t.id)).await.unwrap();
        let err = delete_testimonial(State(state), Path(t.id)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
