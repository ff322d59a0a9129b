use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    auth::{self, CurrentUser},
    badges, chatbot,
    error::AppError,
    insights,
    state::AppState,
};

use super::format_usd;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/insights", get(insights_page))
        .route("/map", get(map_page))
        .route("/profile", get(profile_form).post(profile_submit))
        .route("/profile/picture", post(profile_picture_submit))
        .route("/settings", get(settings_form).post(settings_submit))
        .route("/chatbot", get(chatbot_form).post(chatbot_submit))
        .route("/contact", get(contact))
}

#[derive(Clone)]
struct ReminderRow {
    destination: String,
    days: i64,
}

#[derive(Template)]
#[template(path = "user/home.html")]
struct HomeTemplate {
    username: String,
    badge_name: String,
    trips_logged: usize,
    upcoming_count: usize,
    progress_text: String,
    bio: String,
    favorite_destination: String,
    goals: String,
    reminders: Vec<ReminderRow>,
}

async fn home(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let users = state.store.load_users().await?;
    let account = users.get(&user.username).ok_or(AppError::NotFound)?;

    let all_trips = state.store.load_trips().await?;
    let trips = all_trips
        .get(&user.username)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let today = Local::now().date_naive();
    let badge = badges::badge_for(trips.len() as u32);
    let progress_text = match badge.next_threshold {
        Some(_) => format!("{} to go", badge.remaining(trips.len() as u32)),
        None => "Maxed".to_string(),
    };

    let reminders = insights::upcoming_reminders(trips, today)
        .into_iter()
        .map(|r| ReminderRow {
            destination: r.destination,
            days: r.days_until_start,
        })
        .collect();

    Ok(AskamaTemplateResponse::into_response(HomeTemplate {
        username: user.username.clone(),
        badge_name: badge.name.to_string(),
        trips_logged: trips.len(),
        upcoming_count: insights::upcoming_trip_count(trips, today),
        progress_text,
        bio: placeholder(&account.bio),
        favorite_destination: placeholder(&account.favorite_destination),
        goals: placeholder(&account.goals),
        reminders,
    }))
}

fn placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        "—".to_string()
    } else {
        value.to_string()
    }
}

#[derive(Clone)]
struct TotalRow {
    destination: String,
    amount: String,
}

#[derive(Clone)]
struct SeriesRow {
    date: String,
    cumulative: String,
}

#[derive(Template)]
#[template(path = "user/insights.html")]
struct InsightsTemplate {
    total_trips: usize,
    most_visited: String,
    total_expenses: String,
    has_expenses: bool,
    per_trip: Vec<TotalRow>,
    series: Vec<SeriesRow>,
    chart_rows_json: String,
}

async fn insights_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let all_trips = state.store.load_trips().await?;
    let trips = all_trips
        .get(&user.username)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let today = Local::now().date_naive();
    let per_trip: Vec<TotalRow> = insights::per_trip_expense_totals(trips)
        .into_iter()
        .map(|(destination, total)| TotalRow {
            destination,
            amount: format_usd(total),
        })
        .collect();
    let series: Vec<SeriesRow> = insights::cumulative_expense_series(trips, today)
        .into_iter()
        .map(|(date, cumulative)| SeriesRow {
            date: date.to_string(),
            cumulative: format_usd(cumulative),
        })
        .collect();
    let rows = insights::expense_rows(trips, today);
    let chart_rows_json =
        serde_json::to_string(&rows).map_err(|err| AppError::Other(err.into()))?;

    Ok(AskamaTemplateResponse::into_response(InsightsTemplate {
        total_trips: trips.len(),
        most_visited: insights::most_visited_destination(trips),
        total_expenses: format_usd(insights::total_expenses(trips)),
        has_expenses: !rows.is_empty(),
        per_trip,
        series,
        chart_rows_json,
    }))
}

#[derive(Clone)]
struct PointRow {
    destination: String,
    lat: String,
    lon: String,
    start_date: String,
}

#[derive(Template)]
#[template(path = "user/map.html")]
struct MapTemplate {
    has_points: bool,
    points: Vec<PointRow>,
    points_json: String,
    view_json: String,
}

async fn map_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let all_trips = state.store.load_trips().await?;
    let trips = all_trips
        .get(&user.username)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let points = insights::map_points(trips);
    let view = insights::map_view(&points);
    let points_json =
        serde_json::to_string(&points).map_err(|err| AppError::Other(err.into()))?;
    let view_json = serde_json::to_string(&view).map_err(|err| AppError::Other(err.into()))?;

    let rows = points
        .iter()
        .map(|p| PointRow {
            destination: p.destination.clone(),
            lat: format!("{:.2}", p.lat),
            lon: format!("{:.2}", p.lon),
            start_date: p.start_date.clone(),
        })
        .collect();

    Ok(AskamaTemplateResponse::into_response(MapTemplate {
        has_points: !points.is_empty(),
        points: rows,
        points_json,
        view_json,
    }))
}

#[derive(Template)]
#[template(path = "user/profile.html")]
struct ProfileTemplate {
    username: String,
    bio: String,
    favorite_destination: String,
    goals: String,
    has_profile_pic: bool,
    badge_name: String,
    trips_logged: usize,
    progress_text: String,
}

async fn profile_form(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let users = state.store.load_users().await?;
    let account = users.get(&user.username).ok_or(AppError::NotFound)?;
    let all_trips = state.store.load_trips().await?;
    let trip_count = all_trips
        .get(&user.username)
        .map(Vec::len)
        .unwrap_or_default();
    let badge = badges::badge_for(trip_count as u32);
    let progress_text = match badge.next_threshold {
        Some(_) => format!(
            "{} more trip(s) to the next badge",
            badge.remaining(trip_count as u32)
        ),
        None => "Top badge reached — World Citizen!".to_string(),
    };

    Ok(AskamaTemplateResponse::into_response(ProfileTemplate {
        username: user.username.clone(),
        bio: account.bio.clone(),
        favorite_destination: account.favorite_destination.clone(),
        goals: account.goals.clone(),
        has_profile_pic: account.profile_pic.is_some(),
        badge_name: badge.name.to_string(),
        trips_logged: trip_count,
        progress_text,
    }))
}

#[derive(Deserialize)]
struct ProfileForm {
    bio: String,
    favorite_destination: String,
    goals: String,
}

async fn profile_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    let mut users = state.store.load_users().await?;
    let account = users.get_mut(&user.username).ok_or(AppError::NotFound)?;
    account.bio = form.bio.trim().to_string();
    account.favorite_destination = form.favorite_destination.trim().to_string();
    account.goals = form.goals.trim().to_string();
    state.store.save_users(&users).await?;
    Ok(Redirect::to("/me/profile"))
}

async fn profile_picture_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;

    let mut upload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid upload: {err}")))?
    {
        if field.name() == Some("picture") {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("invalid upload: {err}")))?;
            upload = Some(bytes.to_vec());
        }
    }

    let Some(bytes) = upload.filter(|b| !b.is_empty()) else {
        return Err(AppError::BadRequest("Please upload an image.".into()));
    };

    let stored = state
        .media
        .save_profile_pic(&user.username, &bytes)
        .map_err(|_| AppError::BadRequest("The uploaded file is not a valid image.".into()))?;

    let mut users = state.store.load_users().await?;
    let account = users.get_mut(&user.username).ok_or(AppError::NotFound)?;
    account.profile_pic = Some(stored);
    state.store.save_users(&users).await?;

    Ok(Redirect::to("/me/profile"))
}

#[derive(Template)]
#[template(path = "user/settings.html")]
struct SettingsTemplate;

async fn settings_form(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(SettingsTemplate))
}

#[derive(Deserialize)]
struct PasswordForm {
    new_password: String,
}

async fn settings_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    if form.new_password.is_empty() {
        return Err(AppError::BadRequest("Please enter a new password.".into()));
    }
    let mut users = state.store.load_users().await?;
    let account = users.get_mut(&user.username).ok_or(AppError::NotFound)?;
    account.password_hash = auth::hash_password(&form.new_password)?;
    state.store.save_users(&users).await?;
    Ok(Redirect::to("/me/settings"))
}

#[derive(Template)]
#[template(path = "user/chatbot.html")]
struct ChatbotTemplate {
    has_reply: bool,
    message: String,
    reply: String,
}

async fn chatbot_form(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(ChatbotTemplate {
        has_reply: false,
        message: String::new(),
        reply: String::new(),
    }))
}

#[derive(Deserialize)]
struct ChatForm {
    message: String,
}

async fn chatbot_submit(
    current: CurrentUser,
    Form(form): Form<ChatForm>,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let reply = chatbot::reply_to(&form.message).to_string();
    Ok(AskamaTemplateResponse::into_response(ChatbotTemplate {
        has_reply: true,
        message: form.message,
        reply,
    }))
}

#[derive(Template)]
#[template(path = "user/contact.html")]
struct ContactTemplate;

async fn contact(current: CurrentUser) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(ContactTemplate))
}
