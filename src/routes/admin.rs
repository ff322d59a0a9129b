use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::info;

use crate::{
    auth::{self, CurrentUser},
    badges,
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users_list))
        .route("/impersonate/:username", post(impersonate))
        .route("/users/:username/reset-pic", post(reset_profile_pic))
}

#[derive(Clone)]
struct AdminUserRow {
    username: String,
    role: String,
    trip_count: usize,
    badge_name: String,
    has_profile_pic: bool,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct AdminUsersTemplate {
    users: Vec<AdminUserRow>,
}

async fn users_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_admin()?;
    let users = state.store.load_users().await?;
    let trips = state.store.load_trips().await?;

    let rows = users
        .iter()
        .map(|(username, account)| {
            let trip_count = trips.get(username).map(Vec::len).unwrap_or_default();
            AdminUserRow {
                username: username.clone(),
                role: account.role.to_string(),
                trip_count,
                badge_name: badges::badge_for(trip_count as u32).name.to_string(),
                has_profile_pic: account.profile_pic.is_some(),
            }
        })
        .collect();

    Ok(AskamaTemplateResponse::into_response(AdminUsersTemplate {
        users: rows,
    }))
}

/// "Switch as" a user: the admin's session cookie is replaced with the
/// target user's, exactly like logging in as them.
async fn impersonate(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Path(username): Path<String>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let admin = current.require_admin()?;
    let users = state.store.load_users().await?;
    if !users.contains_key(&username) {
        return Err(AppError::NotFound);
    }
    info!("admin {} switching session to {username}", admin.username);
    Ok((auth::apply_session_cookie(jar, &username), Redirect::to("/me")))
}

async fn reset_profile_pic(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    current.require_admin()?;
    let mut users = state.store.load_users().await?;
    let account = users.get_mut(&username).ok_or(AppError::NotFound)?;
    account.profile_pic = None;
    state.store.save_users(&users).await?;
    state.media.reset_profile_pic(&username).await?;
    Ok(Redirect::to("/admin"))
}
