pub mod admin;
pub mod public;
pub mod trips;
pub mod user;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub(crate) fn format_usd(amount: f64) -> String {
    format!("${amount:.2}")
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .nest("/me", user::router())
        .nest("/me/trips", trips::router())
        .nest("/admin", admin::router())
        .nest_service("/static", ServeDir::new("static"))
        .nest_service("/media", ServeDir::new(state.config.media_root.clone()))
        .with_state(state)
}
