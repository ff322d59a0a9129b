//! Pure aggregations over a user's trip list. Everything here takes
//! slices and returns owned rows, so handlers and tests call it the same
//! way; nothing touches shared state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::geocode;
use crate::models::trip::Trip;

/// Shown when a user has no trips yet.
pub const NO_DESTINATION: &str = "—";

/// Days-before-start window (inclusive) for reminder toasts.
const REMINDER_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub destination: String,
    pub days_until_start: i64,
}

/// One expense flattened out for the charting sink.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExpenseRow {
    pub destination: String,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

/// One pin for the map sink.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapPoint {
    pub destination: String,
    pub lat: f64,
    pub lon: f64,
    pub start_date: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

/// Destination with the highest occurrence count; on a tie the first
/// destination (by first occurrence in the list) wins.
pub fn most_visited_destination(trips: &[Trip]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for trip in trips {
        let dest = trip.destination.trim();
        match counts.iter_mut().find(|(seen, _)| *seen == dest) {
            Some((_, count)) => *count += 1,
            None => counts.push((dest, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (dest, count) in counts {
        if best.map(|(_, max)| count > max).unwrap_or(true) {
            best = Some((dest, count));
        }
    }
    best.map(|(dest, _)| dest.to_string())
        .unwrap_or_else(|| NO_DESTINATION.to_string())
}

/// Sum of every expense across every trip. Malformed amounts already
/// coerced to zero on load.
pub fn total_expenses(trips: &[Trip]) -> f64 {
    trips
        .iter()
        .flat_map(|trip| &trip.expenses)
        .map(|expense| expense.amount)
        .sum()
}

/// Per-destination totals, descending. The sort is stable, so equal
/// totals keep first-occurrence order.
pub fn per_trip_expense_totals(trips: &[Trip]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for trip in trips {
        if trip.expenses.is_empty() {
            continue;
        }
        let total: f64 = trip.expenses.iter().map(|e| e.amount).sum();
        match totals.iter_mut().find(|(dest, _)| *dest == trip.destination) {
            Some((_, sum)) => *sum += total,
            None => totals.push((trip.destination.clone(), total)),
        }
    }
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    totals
}

/// Expenses grouped by their owning trip's start date and running-summed
/// in date order. A trip with an unparseable start date groups under
/// `today`, matching how the rows are charted.
pub fn cumulative_expense_series(trips: &[Trip], today: NaiveDate) -> Vec<(NaiveDate, f64)> {
    let mut daily: Vec<(NaiveDate, f64)> = Vec::new();
    for trip in trips {
        if trip.expenses.is_empty() {
            continue;
        }
        let date = trip.start().unwrap_or(today);
        let total: f64 = trip.expenses.iter().map(|e| e.amount).sum();
        match daily.iter_mut().find(|(d, _)| *d == date) {
            Some((_, sum)) => *sum += total,
            None => daily.push((date, total)),
        }
    }
    daily.sort_by_key(|(date, _)| *date);

    let mut running = 0.0;
    daily
        .into_iter()
        .map(|(date, total)| {
            running += total;
            (date, running)
        })
        .collect()
}

/// Trips starting within the next three days (inclusive of today).
/// Unparseable start dates are skipped, not an error.
pub fn upcoming_reminders(trips: &[Trip], today: NaiveDate) -> Vec<Reminder> {
    trips
        .iter()
        .filter_map(|trip| {
            let start = trip.start()?;
            let days_until_start = (start - today).num_days();
            if (0..=REMINDER_WINDOW_DAYS).contains(&days_until_start) {
                Some(Reminder {
                    destination: trip.destination.clone(),
                    days_until_start,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Trips whose start date is today or later; unparseable dates excluded.
pub fn upcoming_trip_count(trips: &[Trip], today: NaiveDate) -> usize {
    trips
        .iter()
        .filter(|trip| trip.start().map(|start| start >= today).unwrap_or(false))
        .count()
}

/// Flat destination/date/category/amount rows for the chart sink.
pub fn expense_rows(trips: &[Trip], today: NaiveDate) -> Vec<ExpenseRow> {
    let mut rows = Vec::new();
    for trip in trips {
        let date = trip.start().unwrap_or(today);
        for expense in &trip.expenses {
            rows.push(ExpenseRow {
                destination: trip.destination.clone(),
                date,
                category: expense.category.as_str().to_string(),
                amount: expense.amount,
            });
        }
    }
    rows
}

/// Map pins from explicit coordinates, falling back to the centroid
/// table; trips without either are left off the map.
pub fn map_points(trips: &[Trip]) -> Vec<MapPoint> {
    trips
        .iter()
        .filter_map(|trip| {
            let (lat, lon) = match (trip.lat, trip.lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => geocode::coords_for(&trip.destination)?,
            };
            Some(MapPoint {
                destination: trip.destination.clone(),
                lat,
                lon,
                start_date: trip.start_date.clone(),
            })
        })
        .collect()
}

/// View centered on the mean of the pins, world-level zoom.
pub fn map_view(points: &[MapPoint]) -> Option<MapView> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    Some(MapView {
        lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
        lon: points.iter().map(|p| p.lon).sum::<f64>() / n,
        zoom: 1.5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{Expense, ExpenseCategory};

    fn trip(destination: &str, start_date: &str) -> Trip {
        Trip {
            destination: destination.into(),
            start_date: start_date.into(),
            ..Trip::default()
        }
    }

    fn expense(amount: f64) -> Expense {
        Expense {
            category: ExpenseCategory::Misc,
            description: "x".into(),
            amount,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn most_visited_empty_and_tie_break() {
        assert_eq!(most_visited_destination(&[]), NO_DESTINATION);

        let trips = vec![trip("Paris", ""), trip("Paris", ""), trip("Tokyo", "")];
        assert_eq!(most_visited_destination(&trips), "Paris");

        // On a tie, the destination seen first wins.
        let tied = vec![trip("Tokyo", ""), trip("Paris", ""), trip("Paris", ""), trip("Tokyo", "")];
        assert_eq!(most_visited_destination(&tied), "Tokyo");
    }

    #[test]
    fn total_ignores_malformed_amounts_from_load() {
        // Amounts like "bad" arrive as 0.0 after the lenient load.
        let mut t = trip("Rome", "2025-05-01");
        t.expenses = vec![expense(10.50), expense(5.0), expense(0.0)];
        assert_eq!(total_expenses(&[t]), 15.50);
    }

    #[test]
    fn per_trip_totals_sort_descending() {
        let mut cheap = trip("Lisbon", "");
        cheap.expenses = vec![expense(40.0)];
        let mut pricey = trip("Oslo", "");
        pricey.expenses = vec![expense(100.0), expense(55.0)];
        let empty = trip("Quito", "");

        let totals = per_trip_expense_totals(&[cheap, pricey, empty]);
        assert_eq!(totals, vec![("Oslo".to_string(), 155.0), ("Lisbon".to_string(), 40.0)]);
    }

    #[test]
    fn cumulative_series_runs_in_date_order() {
        let today = date(2025, 7, 1);
        let mut late = trip("B", "2025-06-10");
        late.expenses = vec![expense(20.0)];
        let mut early = trip("A", "2025-06-01");
        early.expenses = vec![expense(5.0)];
        let mut undated = trip("C", "not-a-date");
        undated.expenses = vec![expense(1.0)];

        let series = cumulative_expense_series(&[late, early, undated], today);
        assert_eq!(
            series,
            vec![
                (date(2025, 6, 1), 5.0),
                (date(2025, 6, 10), 25.0),
                (date(2025, 7, 1), 26.0),
            ]
        );
    }

    #[test]
    fn reminder_window_is_zero_to_three_days() {
        let today = date(2025, 6, 1);
        let trips = vec![
            trip("Paris", "2025-06-03"),
            trip("Tokyo", "2025-06-10"),
            trip("Rome", "2025-05-30"),
            trip("???", "nope"),
            trip("Oslo", "2025-06-01"),
        ];
        let reminders = upcoming_reminders(&trips, today);
        assert_eq!(
            reminders,
            vec![
                Reminder {
                    destination: "Paris".into(),
                    days_until_start: 2
                },
                Reminder {
                    destination: "Oslo".into(),
                    days_until_start: 0
                },
            ]
        );
    }

    #[test]
    fn upcoming_count_excludes_past_and_unparseable() {
        let today = date(2025, 6, 1);
        let trips = vec![
            trip("Paris", "2025-06-01"),
            trip("Tokyo", "2025-07-01"),
            trip("Rome", "2025-01-01"),
            trip("???", ""),
        ];
        assert_eq!(upcoming_trip_count(&trips, today), 2);
    }

    #[test]
    fn map_points_fall_back_to_centroids() {
        let mut pinned = trip("Somewhere", "2025-01-01");
        pinned.lat = Some(1.0);
        pinned.lon = Some(2.0);
        let fallback = trip("Paris, France", "2025-02-01");
        let unknown = trip("Reykjavik", "2025-03-01");

        let points = map_points(&[pinned, fallback, unknown]);
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].lat, points[0].lon), (1.0, 2.0));
        assert_eq!((points[1].lat, points[1].lon), (48.85, 2.35));

        let view = map_view(&points).unwrap();
        assert_eq!(view.lat, (1.0 + 48.85) / 2.0);
        assert_eq!(view.zoom, 1.5);
        assert_eq!(map_view(&[]), None);
    }
}
