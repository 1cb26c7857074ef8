pub mod analytics;
pub mod auth;
pub mod candidate_routes;
pub mod events;
pub mod export;
pub mod health;
pub mod history;
pub mod jobs;
pub mod notifications;
pub mod pipeline;
pub mod public;
pub mod talent_pool;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::{
    middleware::{
        auth::require_bearer_auth,
        rate_limit::{rps_middleware, RateLimiter},
    },
    services::resume_service::MAX_RESUME_BYTES,
    AppState,
};

/// Multipart framing on top of the largest accepted résumé.
const BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

/// Every API route. Tracing and CORS are layered on by the binary.
pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/public/applications", post(public::submit_application))
        .route("/api/public/jobs", get(jobs::list_public_jobs))
        .route("/api/public/jobs/:id", get(jobs::get_public_job))
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.public_rps),
            rps_middleware,
        ));

    let protected_api = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route(
            "/api/me/preferences",
            get(auth::get_preferences).put(auth::update_preferences),
        )
        .route(
            "/api/candidates",
            get(candidate_routes::list_candidates).post(candidate_routes::create_candidate),
        )
        .route(
            "/api/candidates/duplicates",
            get(candidate_routes::check_duplicates),
        )
        .route(
            "/api/candidates/:id",
            get(candidate_routes::get_candidate)
                .patch(candidate_routes::update_candidate)
                .delete(candidate_routes::delete_candidate),
        )
        .route(
            "/api/candidates/:id/resume",
            post(candidate_routes::upload_resume),
        )
        .route("/api/candidates/:id/stage", post(pipeline::move_stage))
        .route("/api/candidates/:id/stages", get(pipeline::stage_history))
        .route(
            "/api/candidates/:id/talent-pool",
            post(talent_pool::flag_candidate).delete(talent_pool::unflag_candidate),
        )
        .route(
            "/api/candidates/:id/proposal-response",
            post(talent_pool::respond_to_proposal),
        )
        .route(
            "/api/candidates/:id/archive",
            post(talent_pool::archive_candidate),
        )
        .route("/api/pipeline/board", get(pipeline::board))
        .route("/api/talent-pool", get(talent_pool::list_talent_pool))
        .route("/api/history", get(history::list_history))
        .route("/api/history/:id", get(history::get_history))
        .route("/api/history/:id/stages", get(history::history_stages))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/jobs/:id/active", put(jobs::set_job_active))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/poll",
            get(notifications::poll_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/events", get(events::stream_events))
        .route("/api/export/candidates", post(export::export_candidates))
        .route("/api/export/history", get(export::export_history))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth))
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.api_rps),
            rps_middleware,
        ));

    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(protected_api)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
