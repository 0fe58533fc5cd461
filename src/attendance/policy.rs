use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Punch direction as stored in `attendance_logs.log_type`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    In,
    Out,
}

/// How a past day with a punch-in but no punch-out is credited.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteDayPolicy {
    /// The day contributes nothing.
    NoPay,
    /// Credit half a day at half the standard hours.
    HalfDay,
    /// Credit a full day at the standard hours.
    FullDay,
    /// Credit a fixed assumed number of hours, prorated as a day fraction.
    ActualHours,
}

/// Classification of a single calendar day in the aggregator output.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Both punches present, at least the full working day elapsed.
    PresentOvertime,
    /// Both punches present, enough hours for a full day credit.
    Present,
    /// Both punches present but under the full-day minimum.
    HalfDay,
    /// Punch-in only and the day is the current day; "now" stands in for
    /// the punch-out and the credit is provisional.
    Ongoing,
    /// Punch-in only on a past day; credited per [`IncompleteDayPolicy`].
    Incomplete,
}

/// Payroll rules applied by the aggregator. All values come from
/// configuration; `monthly_salary` is per-employee and passed separately.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayrollRules {
    #[schema(example = 8.0)]
    pub working_hours_per_day: f64,

    /// Minimum elapsed hours for a closed session to earn a full day credit.
    #[schema(example = 6.0)]
    pub minimum_hours_full_day: f64,

    #[schema(example = 1.5)]
    pub overtime_multiplier: f64,

    pub incomplete_day_policy: IncompleteDayPolicy,

    /// Hours assumed for an incomplete past day under
    /// [`IncompleteDayPolicy::ActualHours`].
    #[schema(example = 4.0)]
    pub assumed_incomplete_hours: f64,

    #[schema(example = 22.0)]
    pub working_days_per_month: f64,
}

impl Default for PayrollRules {
    fn default() -> Self {
        Self {
            working_hours_per_day: 8.0,
            minimum_hours_full_day: 6.0,
            overtime_multiplier: 1.5,
            incomplete_day_policy: IncompleteDayPolicy::HalfDay,
            assumed_incomplete_hours: 4.0,
            working_days_per_month: 22.0,
        }
    }
}

impl PayrollRules {
    pub fn daily_rate(&self, monthly_salary: f64) -> f64 {
        monthly_salary / self.working_days_per_month
    }

    pub fn hourly_rate(&self, monthly_salary: f64) -> f64 {
        self.daily_rate(monthly_salary) / self.working_hours_per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn log_type_round_trips_through_strings() {
        assert_eq!(LogType::In.to_string(), "IN");
        assert_eq!(LogType::Out.to_string(), "OUT");
        assert_eq!(LogType::from_str("IN").unwrap(), LogType::In);
        assert_eq!(LogType::from_str("out").unwrap(), LogType::Out);
        assert!(LogType::from_str("SIDEWAYS").is_err());
    }

    #[test]
    fn policy_parses_config_spellings() {
        assert_eq!(
            IncompleteDayPolicy::from_str("half_day").unwrap(),
            IncompleteDayPolicy::HalfDay
        );
        assert_eq!(
            IncompleteDayPolicy::from_str("ACTUAL_HOURS").unwrap(),
            IncompleteDayPolicy::ActualHours
        );
    }

    #[test]
    fn rates_follow_from_monthly_salary() {
        let rules = PayrollRules::default();
        assert_eq!(rules.daily_rate(22000.0), 1000.0);
        assert_eq!(rules.hourly_rate(22000.0), 125.0);
    }
}
