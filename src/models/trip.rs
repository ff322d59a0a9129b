use chrono::NaiveDate;
use serde::{de::Deserializer, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Dates travel through the documents as `"YYYY-MM-DD"` strings; anything
/// that fails to parse is treated as absent.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// A logged or planned trip. Every field is defaulted on read so records
/// written by older schema versions come back normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Trip {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub lon: Option<f64>,
}

impl Trip {
    pub fn start(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Expense {
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpenseCategory {
    Flights,
    Hotels,
    Food,
    Activities,
    #[default]
    Misc,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Flights,
        ExpenseCategory::Hotels,
        ExpenseCategory::Food,
        ExpenseCategory::Activities,
        ExpenseCategory::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Flights => "Flights",
            ExpenseCategory::Hotels => "Hotels",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Activities => "Activities",
            ExpenseCategory::Misc => "Misc",
        }
    }

    /// Unknown category names fall back to Misc rather than failing the
    /// whole document load.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "flights" => ExpenseCategory::Flights,
            "hotels" => ExpenseCategory::Hotels,
            "food" => ExpenseCategory::Food,
            "activities" => ExpenseCategory::Activities,
            _ => ExpenseCategory::Misc,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some(name) => ExpenseCategory::from_name(name),
            None => ExpenseCategory::Misc,
        })
    }
}

/// Amounts are non-negative decimals; malformed or negative stored values
/// coerce to zero instead of poisoning the document.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let amount = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(amount.max(0.0))
}

fn lenient_coord<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let coord = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(coord.filter(|c| c.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_record_backfills_all_fields() {
        let trip: Trip = serde_json::from_str(r#"{"destination": "Oslo"}"#).unwrap();
        assert_eq!(trip.destination, "Oslo");
        assert_eq!(trip.start_date, "");
        assert!(trip.expenses.is_empty());
        assert!(trip.checklist.is_empty());
        assert_eq!(trip.lat, None);
        assert_eq!(trip.lon, None);
    }

    #[test]
    fn malformed_amount_coerces_to_zero() {
        let expense: Expense =
            serde_json::from_str(r#"{"category": "Food", "description": "x", "amount": "bad"}"#)
                .unwrap();
        assert_eq!(expense.amount, 0.0);

        let negative: Expense = serde_json::from_str(r#"{"amount": -4.5}"#).unwrap();
        assert_eq!(negative.amount, 0.0);
    }

    #[test]
    fn numeric_string_amount_parses() {
        let expense: Expense = serde_json::from_str(r#"{"amount": "12.75"}"#).unwrap();
        assert_eq!(expense.amount, 12.75);
    }

    #[test]
    fn unknown_category_falls_back_to_misc() {
        let expense: Expense = serde_json::from_str(r#"{"category": "Souvenirs"}"#).unwrap();
        assert_eq!(expense.category, ExpenseCategory::Misc);
    }

    #[test]
    fn malformed_coordinate_coerces_to_none() {
        let trip: Trip = serde_json::from_str(r#"{"lat": "north", "lon": "2.35"}"#).unwrap();
        assert_eq!(trip.lat, None);
        assert_eq!(trip.lon, Some(2.35));
    }

    #[test]
    fn invalid_start_date_is_absent() {
        let trip = Trip {
            start_date: "soonish".into(),
            ..Trip::default()
        };
        assert_eq!(trip.start(), None);
        assert_eq!(parse_date("2025-06-03"), NaiveDate::from_ymd_opt(2025, 6, 3));
    }
}
