pub mod field;

use crate::errors::{DashboardError, DashboardResult};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};
use field::{CronField, FieldKind};
use std::fmt;
use std::str::FromStr;

const MACROS: &[(&str, &str)] = &[
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@midnight", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
];

// Long enough to reach the next Feb 29 across a skipped century leap year.
const SEARCH_DAYS: u32 = 366 * 9;

const MAX_DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    expression: String,
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
}

impl Schedule {
    pub fn parse(expression: &str) -> DashboardResult<Self> {
        let trimmed = expression.trim();
        let expanded = if trimmed.starts_with('@') {
            let lowered = trimmed.to_ascii_lowercase();
            MACROS
                .iter()
                .find(|(alias, _)| *alias == lowered)
                .map(|(_, fields)| *fields)
                .ok_or_else(|| DashboardError::schedule(expression, "unknown macro"))?
        } else {
            trimmed
        };

        let parts = expanded.split_whitespace().collect::<Vec<_>>();
        if parts.len() != FieldKind::ALL.len() {
            return Err(DashboardError::schedule(
                expression,
                format!("expected 5 fields, found {}", parts.len()),
            ));
        }

        let mut fields = Vec::with_capacity(parts.len());
        for (kind, text) in FieldKind::ALL.iter().zip(parts) {
            let field = CronField::parse(*kind, text)
                .map_err(|detail| DashboardError::schedule(expression, format!("{} field: {}", kind.as_str(), detail)))?;
            fields.push(field);
        }

        let schedule = Self {
            expression: expression.trim().to_string(),
            minute: fields[0],
            hour: fields[1],
            day_of_month: fields[2],
            month: fields[3],
            day_of_week: fields[4],
        };
        if !schedule.can_fire() {
            return Err(DashboardError::schedule(
                expression,
                "day-of-month never occurs in the selected months",
            ));
        }
        Ok(schedule)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Earliest whole minute strictly after `after` matching every field,
    /// evaluated in the wall-clock time of `after`'s zone. Local times that do
    /// not exist in that zone are skipped.
    pub fn next_occurrence<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let zone = after.timezone();
        let start = after
            .naive_local()
            .with_second(0)?
            .with_nanosecond(0)?
            + Duration::minutes(1);

        let mut date = start.date();
        for day in 0..SEARCH_DAYS {
            if self.month.contains(date.month()) && self.day_matches(date) {
                let (first_hour, first_minute) = if day == 0 {
                    (start.hour(), start.minute())
                } else {
                    (0, 0)
                };
                for hour in self.hour.values().filter(|hour| *hour >= first_hour) {
                    let floor = if hour == first_hour { first_minute } else { 0 };
                    for minute in self.minute.values().filter(|minute| *minute >= floor) {
                        let naive = date.and_hms_opt(hour, minute, 0)?;
                        if let Some(candidate) = zone.from_local_datetime(&naive).earliest() {
                            if candidate > *after {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let by_day = self.day_of_month.contains(date.day());
        let by_weekday = self.day_of_week.contains(date.weekday().num_days_from_sunday());
        match (self.day_of_month.is_restricted(), self.day_of_week.is_restricted()) {
            (true, true) => by_day || by_weekday,
            (true, false) => by_day,
            (false, true) => by_weekday,
            (false, false) => true,
        }
    }

    fn can_fire(&self) -> bool {
        if !self.day_of_month.is_restricted() || self.day_of_week.is_restricted() {
            return true;
        }
        let Some(first_day) = self.day_of_month.min() else {
            return false;
        };
        self.month
            .values()
            .any(|month| first_day <= MAX_DAYS_IN_MONTH[(month - 1) as usize])
    }
}

impl FromStr for Schedule {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSet {
    schedules: Vec<Schedule>,
}

impl ScheduleSet {
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> DashboardResult<Self> {
        if expressions.is_empty() {
            return Err(DashboardError::ScheduleParse(
                "at least one schedule is required".to_string(),
            ));
        }
        let schedules = expressions
            .iter()
            .map(|expression| Schedule::parse(expression.as_ref()))
            .collect::<DashboardResult<Vec<_>>>()?;
        Ok(Self { schedules })
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn next_occurrence<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.next_occurrence(after))
            .min()
    }
}
