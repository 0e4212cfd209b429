//! Recurrence rules: when a habit is due, and what makes a rule well-formed.
//!
//! A habit's recurrence arrives from the boundary in flat form
//! ([`RecurrenceSpec`]: frequency string, count, mixed occurrence-day array)
//! and is validated into the closed [`Recurrence`] enum, so weekday sets and
//! day-of-month sets cannot be mixed up downstream. Due-date evaluation is a
//! pure predicate over the calendar date.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};

/// Upper bound for `frequency_count` accepted at the boundary.
pub const MAX_FREQUENCY_COUNT: i64 = 100;

/// Frequency discriminant as it appears at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyKind {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl FrequencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyKind::Daily => "daily",
            FrequencyKind::Weekly => "weekly",
            FrequencyKind::Monthly => "monthly",
            FrequencyKind::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(FrequencyKind::Daily),
            "weekly" => Some(FrequencyKind::Weekly),
            "monthly" => Some(FrequencyKind::Monthly),
            "custom" => Some(FrequencyKind::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for FrequencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the boundary `occurrence_days` array.
///
/// Weekly habits send weekday names, monthly habits send day-of-month
/// integers; the JSON array mixes both shapes, hence the untagged repr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OccurrenceDay {
    DayOfMonth(i64),
    Weekday(String),
}

/// Flat, unvalidated recurrence definition as received from the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub frequency: FrequencyKind,
    #[serde(default)]
    pub frequency_count: i64,
    #[serde(default)]
    pub occurrence_days: Vec<OccurrenceDay>,
}

/// A validated recurrence rule.
///
/// `Weekly`/`Monthly` with an empty day set is a legal not-yet-configured
/// rule (frequency count 0 at the boundary); it is never due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Due every day from the start date.
    Daily,
    /// Due on the listed weekdays.
    Weekly { days: Vec<Weekday> },
    /// Due on the listed days of the month (1-31). A day missing from a
    /// shorter month is simply not due that month; no rollover.
    Monthly { days: Vec<u8> },
    /// Extension point: due every `interval_days` days from the start date.
    /// Zero means not configured and never due.
    Custom { interval_days: u32 },
}

impl Recurrence {
    pub fn kind(&self) -> FrequencyKind {
        match self {
            Recurrence::Daily => FrequencyKind::Daily,
            Recurrence::Weekly { .. } => FrequencyKind::Weekly,
            Recurrence::Monthly { .. } => FrequencyKind::Monthly,
            Recurrence::Custom { .. } => FrequencyKind::Custom,
        }
    }

    /// Whether a check-in is expected on `date`.
    ///
    /// Pure and deterministic: inactive habits are never due, nothing is
    /// due before `start_date`, and the rest depends only on the rule and
    /// the candidate date.
    pub fn is_due_on(&self, start_date: NaiveDate, active: bool, date: NaiveDate) -> bool {
        if !active || date < start_date {
            return false;
        }
        match self {
            Recurrence::Daily => true,
            Recurrence::Weekly { days } => days.contains(&date.weekday()),
            Recurrence::Monthly { days } => days.contains(&(date.day() as u8)),
            Recurrence::Custom { interval_days } => {
                *interval_days > 0
                    && (date - start_date).num_days() % i64::from(*interval_days) == 0
            }
        }
    }

    /// Flat boundary form of the day set.
    pub fn occurrence_days(&self) -> Vec<OccurrenceDay> {
        match self {
            Recurrence::Daily | Recurrence::Custom { .. } => Vec::new(),
            Recurrence::Weekly { days } => days
                .iter()
                .map(|d| OccurrenceDay::Weekday(weekday_name(*d).to_string()))
                .collect(),
            Recurrence::Monthly { days } => days
                .iter()
                .map(|d| OccurrenceDay::DayOfMonth(i64::from(*d)))
                .collect(),
        }
    }

    /// Rebuild the flat boundary form.
    pub fn to_spec(&self, frequency_count: i64) -> RecurrenceSpec {
        RecurrenceSpec {
            frequency: self.kind(),
            frequency_count,
            occurrence_days: self.occurrence_days(),
        }
    }
}

impl RecurrenceSpec {
    /// Validate the flat definition into a typed rule.
    ///
    /// Runs the full field-level check of the create/edit contract:
    /// count range, day-shape per frequency, duplicate days, and the
    /// exact day-count match for weekly/monthly rules with a count.
    /// All failures are collected, never just the first.
    pub fn validate(&self) -> Result<Recurrence, ValidationErrors> {
        let mut errors: Vec<ValidationError> = Vec::new();

        if self.frequency_count < 0 {
            errors.push(ValidationError::NegativeFrequencyCount {
                got: self.frequency_count,
            });
        } else if self.frequency_count > MAX_FREQUENCY_COUNT {
            errors.push(ValidationError::FrequencyCountTooLarge {
                got: self.frequency_count,
                max: MAX_FREQUENCY_COUNT,
            });
        }

        let rule = match self.frequency {
            FrequencyKind::Daily => {
                if !self.occurrence_days.is_empty() {
                    errors.push(ValidationError::UnexpectedOccurrenceDays {
                        frequency: "daily".to_string(),
                    });
                }
                Recurrence::Daily
            }
            FrequencyKind::Weekly => {
                let mut days: Vec<Weekday> = Vec::new();
                for day in &self.occurrence_days {
                    match day {
                        OccurrenceDay::Weekday(name) => match parse_weekday(name) {
                            Some(wd) => {
                                if days.contains(&wd) {
                                    errors.push(ValidationError::DuplicateOccurrenceDay {
                                        day: name.clone(),
                                    });
                                } else {
                                    days.push(wd);
                                }
                            }
                            None => errors.push(ValidationError::UnknownWeekday {
                                name: name.clone(),
                            }),
                        },
                        OccurrenceDay::DayOfMonth(n) => {
                            errors.push(ValidationError::ExpectedWeekdayName {
                                got: n.to_string(),
                            });
                        }
                    }
                }
                check_day_count(&mut errors, self.frequency_count, days.len());
                days.sort_by_key(|d| d.num_days_from_monday());
                Recurrence::Weekly { days }
            }
            FrequencyKind::Monthly => {
                let mut days: Vec<u8> = Vec::new();
                for day in &self.occurrence_days {
                    match day {
                        OccurrenceDay::DayOfMonth(n) => {
                            if !(1..=31).contains(n) {
                                errors.push(ValidationError::MonthDayOutOfRange { day: *n });
                            } else if days.contains(&(*n as u8)) {
                                errors.push(ValidationError::DuplicateOccurrenceDay {
                                    day: n.to_string(),
                                });
                            } else {
                                days.push(*n as u8);
                            }
                        }
                        OccurrenceDay::Weekday(name) => {
                            errors.push(ValidationError::ExpectedMonthDay {
                                got: name.clone(),
                            });
                        }
                    }
                }
                check_day_count(&mut errors, self.frequency_count, days.len());
                days.sort_unstable();
                Recurrence::Monthly { days }
            }
            FrequencyKind::Custom => {
                if !self.occurrence_days.is_empty() {
                    errors.push(ValidationError::UnexpectedOccurrenceDays {
                        frequency: "custom".to_string(),
                    });
                }
                Recurrence::Custom {
                    interval_days: self.frequency_count.clamp(0, MAX_FREQUENCY_COUNT) as u32,
                }
            }
        };

        if errors.is_empty() {
            Ok(rule)
        } else {
            Err(errors.into())
        }
    }
}

/// Weekly/monthly cardinality rule: with a positive count, the selected
/// days must match it exactly. Count 0 leaves the rule unconstrained.
fn check_day_count(errors: &mut Vec<ValidationError>, frequency_count: i64, selected: usize) {
    if frequency_count <= 0 {
        return;
    }
    let required = frequency_count as usize;
    if selected < required {
        errors.push(ValidationError::SelectMoreDays {
            missing: required - selected,
        });
    } else if selected > required {
        errors.push(ValidationError::TooManyDays { selected, required });
    }
}

/// Parse a weekday name ("Monday", "mon", case-insensitive).
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.parse::<Weekday>().ok()
}

/// Full weekday name as used at the boundary.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
