use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login_form).post(login_submit))
        .route("/signup", get(signup_form).post(signup_submit))
        .route("/logout", post(logout))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    logged_in: bool,
    username: String,
}

async fn landing(current: CurrentUser) -> impl IntoResponse {
    let username = current
        .0
        .as_ref()
        .map(|user| user.username.clone())
        .unwrap_or_default();
    AskamaTemplateResponse::into_response(LandingTemplate {
        logged_in: current.0.is_some(),
        username,
    })
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    show_error: bool,
    error_message: String,
    username: String,
}

async fn login_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LoginTemplate {
        show_error: false,
        error_message: String::new(),
        username: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match auth::authenticate_user(&state, &form.username, &form.password).await {
        Ok(user) => Ok((
            auth::apply_session_cookie(jar, &user.username),
            Redirect::to("/me"),
        )
            .into_response()),
        // Same message whether the username or the password was wrong.
        Err(AppError::Unauthorized) => Ok(render_login_error(
            form.username,
            "Invalid credentials.".into(),
        )),
        Err(AppError::BadRequest(msg)) => Ok(render_login_error(form.username, msg)),
        Err(err) => Err(err),
    }
}

fn render_login_error(username: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(LoginTemplate {
            show_error: true,
            error_message: message,
            username,
        }),
    )
        .into_response()
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    show_error: bool,
    error_message: String,
    username: String,
}

async fn signup_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(SignupTemplate {
        show_error: false,
        error_message: String::new(),
        username: String::new(),
    })
}

#[derive(Deserialize)]
struct SignupForm {
    username: String,
    password: String,
    password_confirm: String,
}

async fn signup_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(render_signup_error(
            form.username,
            "The passwords do not match.".into(),
        ));
    }

    match auth::register_user(&state, &form.username, &form.password).await {
        Ok(user) => Ok((
            auth::apply_session_cookie(jar, &user.username),
            Redirect::to("/me"),
        )
            .into_response()),
        Err(AppError::BadRequest(msg)) => Ok(render_signup_error(form.username, msg)),
        Err(err) => Err(err),
    }
}

fn render_signup_error(username: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(SignupTemplate {
            show_error: true,
            error_message: message,
            username,
        }),
    )
        .into_response()
}

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    (auth::clear_session_cookie(jar), Redirect::to("/"))
}
