use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    badges,
    error::AppError,
    models::trip::{ChecklistItem, Expense, ExpenseCategory, Trip},
    state::AppState,
};

use super::format_usd;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trips_page).post(trip_create))
        .route("/:idx/delete", post(trip_delete))
        .route("/:idx/checklist", post(checklist_add))
        .route("/:idx/checklist/:item", post(checklist_update))
        .route("/:idx/checklist/:item/delete", post(checklist_delete))
        .route("/:idx/expenses", post(expense_add))
        .route("/:idx/expenses/:entry", post(expense_update))
        .route("/:idx/expenses/:entry/delete", post(expense_delete))
}

#[derive(Clone)]
struct ChecklistRow {
    index: usize,
    text: String,
    done: bool,
}

#[derive(Clone)]
struct ExpenseRow {
    index: usize,
    category: String,
    description: String,
    amount: String,
}

#[derive(Clone)]
struct TripRow {
    index: usize,
    destination: String,
    start_date: String,
    end_date: String,
    notes: String,
    countdown: String,
    expense_total: String,
    checklist: Vec<ChecklistRow>,
    expenses: Vec<ExpenseRow>,
}

#[derive(Template)]
#[template(path = "user/trips.html")]
struct TripsTemplate {
    show_error: bool,
    error_message: String,
    has_trips: bool,
    badge_line: String,
    trips: Vec<TripRow>,
    categories: Vec<&'static str>,
}

async fn trips_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let all_trips = state.store.load_trips().await?;
    let trips = all_trips
        .get(&user.username)
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(render_trips(trips, false, String::new()))
}

fn render_trips(trips: &[Trip], show_error: bool, error_message: String) -> Response {
    let today = Local::now().date_naive();
    let badge = badges::badge_for(trips.len() as u32);
    let badge_line = match badge.next_threshold {
        Some(_) => format!(
            "Current badge: {} • Trips: {} • Next in: {} trip(s)",
            badge.name,
            trips.len(),
            badge.remaining(trips.len() as u32)
        ),
        None => format!(
            "Current badge: {} • Trips: {} • Max badge achieved!",
            badge.name,
            trips.len()
        ),
    };

    let rows = trips
        .iter()
        .enumerate()
        .map(|(index, trip)| {
            let countdown = match trip.start() {
                Some(start) => {
                    let days_left = (start - today).num_days();
                    if days_left >= 0 {
                        format!("Starts in {days_left} day(s)")
                    } else {
                        "Trip started/finished".to_string()
                    }
                }
                None => String::new(),
            };
            TripRow {
                index,
                destination: trip.destination.clone(),
                start_date: trip.start_date.clone(),
                end_date: trip.end_date.clone(),
                notes: trip.notes.clone(),
                countdown,
                expense_total: format_usd(trip.expenses.iter().map(|e| e.amount).sum()),
                checklist: trip
                    .checklist
                    .iter()
                    .enumerate()
                    .map(|(item_index, item)| ChecklistRow {
                        index: item_index,
                        text: item.text.clone(),
                        done: item.done,
                    })
                    .collect(),
                expenses: trip
                    .expenses
                    .iter()
                    .enumerate()
                    .map(|(entry_index, expense)| ExpenseRow {
                        index: entry_index,
                        category: expense.category.as_str().to_string(),
                        description: expense.description.clone(),
                        amount: format_usd(expense.amount),
                    })
                    .collect(),
            }
        })
        .collect();

    let template = TripsTemplate {
        show_error,
        error_message,
        has_trips: !trips.is_empty(),
        badge_line,
        trips: rows,
        categories: ExpenseCategory::ALL.iter().map(|c| c.as_str()).collect(),
    };
    if show_error {
        (StatusCode::BAD_REQUEST, AskamaTemplateResponse::into_response(template)).into_response()
    } else {
        AskamaTemplateResponse::into_response(template)
    }
}

#[derive(Deserialize)]
struct TripForm {
    destination: String,
    start_date: String,
    end_date: String,
    notes: String,
    lat: String,
    lon: String,
}

async fn trip_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let destination = form.destination.trim().to_string();
    if destination.is_empty() {
        let all_trips = state.store.load_trips().await?;
        let trips = all_trips
            .get(&user.username)
            .map(Vec::as_slice)
            .unwrap_or_default();
        return Ok(render_trips(
            trips,
            true,
            "Please enter a destination.".into(),
        ));
    }

    let trip = Trip {
        destination,
        start_date: form.start_date.trim().to_string(),
        end_date: form.end_date.trim().to_string(),
        notes: form.notes.trim().to_string(),
        expenses: Vec::new(),
        checklist: Vec::new(),
        lat: parse_coord(&form.lat),
        lon: parse_coord(&form.lon),
    };

    let mut all_trips = state.store.load_trips().await?;
    all_trips.entry(user.username.clone()).or_default().push(trip);
    state.store.save_trips(&all_trips).await?;

    Ok(Redirect::to("/me/trips").into_response())
}

/// Invalid coordinate input coerces to None rather than being rejected.
fn parse_coord(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|c| c.is_finite())
}

async fn trip_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(idx): Path<usize>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    mutate_trips(&state, &user.username, |trips| {
        if idx >= trips.len() {
            return Err(AppError::NotFound);
        }
        trips.remove(idx);
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

#[derive(Deserialize)]
struct ChecklistAddForm {
    text: String,
}

async fn checklist_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(idx): Path<usize>,
    Form(form): Form<ChecklistAddForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    let text = form.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::BadRequest("Please type an item first.".into()));
    }
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        trip.checklist.push(ChecklistItem { text, done: false });
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

#[derive(Deserialize)]
struct ChecklistUpdateForm {
    #[serde(default)]
    text: String,
    // Present when the box is ticked, absent otherwise.
    done: Option<String>,
}

async fn checklist_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((idx, item)): Path<(usize, usize)>,
    Form(form): Form<ChecklistUpdateForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        let entry = trip.checklist.get_mut(item).ok_or(AppError::NotFound)?;
        entry.done = form.done.is_some();
        let text = form.text.trim();
        if !text.is_empty() {
            entry.text = text.to_string();
        }
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

async fn checklist_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((idx, item)): Path<(usize, usize)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        if item >= trip.checklist.len() {
            return Err(AppError::NotFound);
        }
        trip.checklist.remove(item);
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

#[derive(Deserialize)]
struct ExpenseForm {
    category: String,
    description: String,
    amount: String,
}

impl ExpenseForm {
    fn into_expense(self) -> Result<Expense, AppError> {
        let description = self.description.trim().to_string();
        let amount = self.amount.trim().parse::<f64>().unwrap_or(0.0);
        if description.is_empty() || !(amount > 0.0) {
            return Err(AppError::BadRequest(
                "Enter a description and a positive amount.".into(),
            ));
        }
        Ok(Expense {
            category: ExpenseCategory::from_name(&self.category),
            description,
            amount,
        })
    }
}

async fn expense_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(idx): Path<usize>,
    Form(form): Form<ExpenseForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    let expense = form.into_expense()?;
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        trip.expenses.push(expense);
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

async fn expense_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((idx, entry)): Path<(usize, usize)>,
    Form(form): Form<ExpenseForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    let expense = form.into_expense()?;
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        let slot = trip.expenses.get_mut(entry).ok_or(AppError::NotFound)?;
        *slot = expense;
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

async fn expense_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((idx, entry)): Path<(usize, usize)>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    mutate_trips(&state, &user.username, |trips| {
        let trip = trips.get_mut(idx).ok_or(AppError::NotFound)?;
        if entry >= trip.expenses.len() {
            return Err(AppError::NotFound);
        }
        trip.expenses.remove(entry);
        Ok(())
    })
    .await?;
    Ok(Redirect::to("/me/trips"))
}

/// Read-modify-write over one user's trip list. The whole document is
/// rewritten; concurrent sessions race and the last save wins.
async fn mutate_trips<F>(state: &AppState, username: &str, mutate: F) -> Result<(), AppError>
where
    F: FnOnce(&mut Vec<Trip>) -> Result<(), AppError>,
{
    let mut all_trips = state.store.load_trips().await?;
    let trips = all_trips.entry(username.to_string()).or_default();
    mutate(trips)?;
    state.store.save_trips(&all_trips).await?;
    Ok(())
}
