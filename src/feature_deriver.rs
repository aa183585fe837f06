//! Engineered features computed from raw customer attributes.
//!
//! Each derivation is a pure function of the record that yields a value,
//! an explicit "missing", or nothing at all. Derivations run in the order of
//! [`DERIVATIONS`] and only when their target column is absent or missing,
//! so values the caller already supplied are never overwritten.

use crate::record::{is_missing_numeric, number_value, numeric_field, numeric_or, RawRecord};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

pub const DEPENDENTS: &str = "Dependents";
pub const INCOME_PER_CAPITA: &str = "IncomePerCapita";
pub const TOTAL_SPENT: &str = "TotalSpent";
pub const AGE: &str = "Age";
pub const DAYS_SINCE_ENROLL: &str = "DaysSinceEnroll";

/// Spend columns summed into `TotalSpent`.
pub const SPEND_FIELDS: [&str; 6] = [
    "MntWines",
    "MntFruits",
    "MntMeatProducts",
    "MntFishProducts",
    "MntSweetProducts",
    "MntGoldProds",
];

/// Result of evaluating one derivation against a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derived {
    Value(f64),
    /// Source present but no safe value exists; stored as null.
    Missing,
    /// Sources absent; the record is left untouched.
    Skip,
}

/// A named derivation rule.
pub struct Derivation {
    pub target: &'static str,
    pub rule: fn(&FeatureDeriver, &RawRecord) -> Derived,
}

/// Derivations in application order. `IncomePerCapita` reads the value
/// `Dependents` may have just received.
pub const DERIVATIONS: [Derivation; 5] = [
    Derivation {
        target: DEPENDENTS,
        rule: dependents,
    },
    Derivation {
        target: INCOME_PER_CAPITA,
        rule: income_per_capita,
    },
    Derivation {
        target: TOTAL_SPENT,
        rule: total_spent,
    },
    Derivation {
        target: AGE,
        rule: age,
    },
    Derivation {
        target: DAYS_SINCE_ENROLL,
        rule: days_since_enroll,
    },
];

/// Default reference date for `DaysSinceEnroll`.
pub fn default_enroll_reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Computes engineered features relative to a fixed year and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDeriver {
    current_year: i32,
    enroll_reference: NaiveDate,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new(Local::now().year(), default_enroll_reference())
    }
}

impl FeatureDeriver {
    pub fn new(current_year: i32, enroll_reference: NaiveDate) -> Self {
        Self {
            current_year,
            enroll_reference,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn enroll_reference(&self) -> NaiveDate {
        self.enroll_reference
    }

    /// Return `record` enriched with every computable engineered feature.
    pub fn derive(&self, mut record: RawRecord) -> RawRecord {
        for derivation in &DERIVATIONS {
            if !is_missing_numeric(&record, derivation.target) {
                continue;
            }
            match (derivation.rule)(self, &record) {
                Derived::Value(v) => {
                    record.insert(derivation.target.to_string(), number_value(v));
                }
                Derived::Missing => {
                    record.insert(derivation.target.to_string(), Value::Null);
                }
                Derived::Skip => {}
            }
        }
        record
    }
}

fn dependents(_: &FeatureDeriver, record: &RawRecord) -> Derived {
    Derived::Value(numeric_or(record, "Kidhome", 0.0) + numeric_or(record, "Teenhome", 0.0))
}

fn income_per_capita(_: &FeatureDeriver, record: &RawRecord) -> Derived {
    match numeric_field(record, "Income") {
        Some(income) => Derived::Value(income / (1.0 + numeric_or(record, DEPENDENTS, 0.0))),
        None => Derived::Skip,
    }
}

fn total_spent(_: &FeatureDeriver, record: &RawRecord) -> Derived {
    if !SPEND_FIELDS.iter().any(|f| record.contains_key(*f)) {
        return Derived::Skip;
    }
    Derived::Value(SPEND_FIELDS.iter().map(|f| numeric_or(record, f, 0.0)).sum())
}

fn age(deriver: &FeatureDeriver, record: &RawRecord) -> Derived {
    if !record.contains_key("Year_Birth") {
        return Derived::Skip;
    }
    let year = f64::from(deriver.current_year);
    Derived::Value(year - numeric_or(record, "Year_Birth", year))
}

fn days_since_enroll(deriver: &FeatureDeriver, record: &RawRecord) -> Derived {
    let Some(raw) = record.get("Dt_Customer") else {
        return Derived::Skip;
    };
    let enrolled = match raw {
        Value::String(s) => parse_day_first(s, deriver.current_year),
        _ => None,
    };
    match enrolled {
        Some(dt) => {
            let reference = deriver.enroll_reference.and_time(NaiveTime::MIN);
            let seconds = (reference - dt).num_seconds();
            Derived::Value(seconds.div_euclid(86_400) as f64)
        }
        None => Derived::Missing,
    }
}

/// Date layouts tried in order: day-first, then year-first, then month-first
/// for inputs whose day-first reading is not a valid date.
const DATE_FORMATS: [&str; 8] = [
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parse a date written day-first (`31/12/2023`, `31-12-2023 10:15`), an ISO
/// date (`2023-12-31`) or an RFC 3339 timestamp.
///
/// Two-digit years land within 50 years of `current_year`, so in 2026 `70`
/// reads as 2070 and `77` as 1977.
pub fn parse_day_first(input: &str, current_year: i32) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }

    let (date_part, time_part) = match input.split_once([' ', 'T']) {
        Some((d, t)) => (d, t.trim()),
        None => (input, ""),
    };
    let time = if time_part.is_empty() {
        NaiveTime::MIN
    } else {
        TIME_FORMATS
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(time_part, f).ok())?
    };

    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())?;
    let date = if date.year() < 100 {
        date.with_year(century_window(date.year(), current_year))?
    } else {
        date
    };
    Some(date.and_time(time))
}

fn century_window(two_digit: i32, current_year: i32) -> i32 {
    let year = current_year - current_year.rem_euclid(100) + two_digit;
    if year >= current_year + 50 {
        year - 100
    } else if year < current_year - 50 {
        year + 100
    } else {
        year
    }
}
