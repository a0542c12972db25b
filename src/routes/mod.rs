use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::AppState;

mod admin;
mod night;
mod user;
mod video;

pub fn router(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let night_video_dir = state.media.dir().to_path_buf();

    Router::new()
        .route("/api/health", get(health))
        .route("/api/video", get(video::random_video))
        .route("/api/user/register", post(user::register))
        .route("/api/user/login", post(user::login))
        .route("/api/user/favorite", post(user::toggle_favorite))
        .route("/api/user/favorites", get(user::list_favorites))
        .route("/api/admin/login", post(admin::login))
        .route(
            "/api/admin/password",
            get(admin::password_status).post(admin::change_password),
        )
        .route("/api/admin/stats", get(admin::stats))
        .route(
            "/api/admin/night-password",
            get(admin::night_password).post(admin::set_night_password),
        )
        .route("/api/night/list", get(night::list))
        .route("/api/night/random", get(night::random))
        .route("/api/night/upload", post(night::upload))
        .route("/api/night/delete", post(night::delete))
        .route("/api/night/verify", post(night::verify))
        .nest_service("/night-videos", ServeDir::new(night_video_dir))
        .route_service("/admin", ServeFile::new(public_dir.join("admin.html")))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
