use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::policy::{DayStatus, IncompleteDayPolicy, PayrollRules};
use super::session::{DaySession, Punch, reconstruct_sessions};

/// Classification of one calendar day after session reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayRecord {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,

    pub status: DayStatus,

    /// Elapsed (or assumed) hours behind the regular/overtime split.
    pub worked_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub day_credit: f64,
}

/// Aggregate output for one employee over one period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    pub days: Vec<DayRecord>,
    pub total_regular_hours: f64,
    pub total_overtime_hours: f64,
    pub total_day_credits: f64,
    pub basic_pay: f64,
    pub overtime_pay: f64,
    pub total_pay: f64,
}

/// Derives per-day classifications, hour totals, and pay figures from one
/// employee's punches over a period.
///
/// Pure and deterministic given the punches, the rules, the salary, and
/// `now` (UTC), which both marks the current day and stands in for the
/// punch-out of a still-open session on it. Absent days simply do not
/// appear in the output; an empty log set yields all-zero totals.
pub fn summarize(
    punches: &[Punch],
    rules: &PayrollRules,
    monthly_salary: f64,
    now: NaiveDateTime,
) -> AttendanceSummary {
    let today = now.date();
    let days: Vec<DayRecord> = reconstruct_sessions(punches)
        .iter()
        .map(|session| classify_day(session, rules, today, now))
        .collect();

    let total_regular_hours: f64 = days.iter().map(|d| d.regular_hours).sum();
    let total_overtime_hours: f64 = days.iter().map(|d| d.overtime_hours).sum();
    let total_day_credits: f64 = days.iter().map(|d| d.day_credit).sum();

    let basic_pay = match rules.incomplete_day_policy {
        // Hour-based pay: credits are informational, hours are money.
        IncompleteDayPolicy::ActualHours => rules.hourly_rate(monthly_salary) * total_regular_hours,
        // Day-based pay under every other policy.
        _ => rules.daily_rate(monthly_salary) * total_day_credits,
    };
    let overtime_pay =
        total_overtime_hours * rules.hourly_rate(monthly_salary) * rules.overtime_multiplier;

    AttendanceSummary {
        days,
        total_regular_hours,
        total_overtime_hours,
        total_day_credits,
        basic_pay,
        overtime_pay,
        total_pay: basic_pay + overtime_pay,
    }
}

fn classify_day(
    session: &DaySession,
    rules: &PayrollRules,
    today: NaiveDate,
    now: NaiveDateTime,
) -> DayRecord {
    match session.clock_out {
        Some(out) => {
            let elapsed = hours_between(session.clock_in, out);
            let (status, regular, overtime, credit) = split_elapsed(elapsed, rules);
            DayRecord {
                date: session.date,
                clock_in: session.clock_in,
                clock_out: Some(out),
                status,
                worked_hours: elapsed,
                regular_hours: regular,
                overtime_hours: overtime,
                day_credit: credit,
            }
        }
        None if session.date == today => {
            // Open session on the current day: "now" is the provisional out.
            let elapsed = hours_between(session.clock_in, now).max(0.0);
            let (_, regular, overtime, credit) = split_elapsed(elapsed, rules);
            DayRecord {
                date: session.date,
                clock_in: session.clock_in,
                clock_out: None,
                status: DayStatus::Ongoing,
                worked_hours: elapsed,
                regular_hours: regular,
                overtime_hours: overtime,
                day_credit: credit,
            }
        }
        None => {
            let (worked, regular, credit) = match rules.incomplete_day_policy {
                IncompleteDayPolicy::NoPay => (0.0, 0.0, 0.0),
                IncompleteDayPolicy::HalfDay => {
                    let h = rules.working_hours_per_day / 2.0;
                    (h, h, 0.5)
                }
                IncompleteDayPolicy::FullDay => {
                    (rules.working_hours_per_day, rules.working_hours_per_day, 1.0)
                }
                IncompleteDayPolicy::ActualHours => {
                    let h = rules.assumed_incomplete_hours;
                    (h, h, h / rules.working_hours_per_day)
                }
            };
            DayRecord {
                date: session.date,
                clock_in: session.clock_in,
                clock_out: None,
                status: DayStatus::Incomplete,
                worked_hours: worked,
                regular_hours: regular,
                overtime_hours: 0.0,
                day_credit: credit,
            }
        }
    }
}

/// Splits elapsed hours for a session into (status, regular, overtime,
/// day credit) under the configured thresholds.
fn split_elapsed(elapsed: f64, rules: &PayrollRules) -> (DayStatus, f64, f64, f64) {
    if elapsed >= rules.working_hours_per_day {
        (
            DayStatus::PresentOvertime,
            rules.working_hours_per_day,
            elapsed - rules.working_hours_per_day,
            1.0,
        )
    } else if elapsed >= rules.minimum_hours_full_day {
        (DayStatus::Present, elapsed, 0.0, 1.0)
    } else {
        (DayStatus::HalfDay, elapsed, 0.0, 0.5)
    }
}

fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::policy::LogType;
    use proptest::prelude::*;

    // Scenario config throughout: 8h days, 6h full-day minimum, 22 working
    // days on a 22000 salary => daily rate 1000, hourly rate 125, OT x1.5.
    fn rules(policy: IncompleteDayPolicy) -> PayrollRules {
        PayrollRules {
            incomplete_day_policy: policy,
            ..PayrollRules::default()
        }
    }

    const SALARY: f64 = 22000.0;

    fn ts(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn punch(day: u32, hour: u32, min: u32, kind: LogType) -> Punch {
        Punch {
            at: ts(day, hour, min),
            kind,
        }
    }

    // "now" well past every test day so closed days are in the past.
    fn month_end() -> NaiveDateTime {
        ts(31, 23, 0)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_logs_produce_zero_totals() {
        let summary = summarize(&[], &rules(IncompleteDayPolicy::HalfDay), SALARY, month_end());
        assert!(summary.days.is_empty());
        assert_close(summary.total_regular_hours, 0.0);
        assert_close(summary.total_overtime_hours, 0.0);
        assert_close(summary.total_day_credits, 0.0);
        assert_close(summary.total_pay, 0.0);
    }

    #[test]
    fn nine_hour_day_splits_into_regular_and_overtime() {
        let punches = [punch(2, 9, 0, LogType::In), punch(2, 18, 0, LogType::Out)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::PresentOvertime);
        assert_close(day.regular_hours, 8.0);
        assert_close(day.overtime_hours, 1.0);
        assert_close(day.day_credit, 1.0);

        assert_close(summary.basic_pay, 1000.0);
        assert_close(summary.overtime_pay, 187.5);
        assert_close(summary.total_pay, 1187.5);
    }

    #[test]
    fn seven_hour_day_is_present_without_overtime() {
        let punches = [punch(2, 9, 0, LogType::In), punch(2, 16, 0, LogType::Out)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::Present);
        assert_close(day.regular_hours, 7.0);
        assert_close(day.overtime_hours, 0.0);
        assert_close(day.day_credit, 1.0);
    }

    #[test]
    fn exactly_working_hours_counts_as_overtime_status_with_zero_overtime() {
        let punches = [punch(2, 9, 0, LogType::In), punch(2, 17, 0, LogType::Out)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::PresentOvertime);
        assert_close(day.regular_hours, 8.0);
        assert_close(day.overtime_hours, 0.0);
    }

    #[test]
    fn four_hour_day_earns_half_credit() {
        let punches = [punch(2, 9, 0, LogType::In), punch(2, 13, 0, LogType::Out)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::HalfDay);
        assert_close(day.regular_hours, 4.0);
        assert_close(day.day_credit, 0.5);
        assert_close(summary.basic_pay, 500.0);
    }

    #[test]
    fn incomplete_past_day_under_half_day_policy() {
        let punches = [punch(2, 9, 0, LogType::In)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::Incomplete);
        assert_close(day.regular_hours, 4.0);
        assert_close(day.day_credit, 0.5);
        assert_close(summary.basic_pay, 500.0);
    }

    #[test]
    fn incomplete_past_day_under_no_pay_policy_contributes_nothing() {
        let punches = [punch(2, 9, 0, LogType::In)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::NoPay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::Incomplete);
        assert_close(day.regular_hours, 0.0);
        assert_close(day.day_credit, 0.0);
        assert_close(summary.total_pay, 0.0);
    }

    #[test]
    fn incomplete_past_day_under_full_day_policy() {
        let punches = [punch(2, 9, 0, LogType::In)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::FullDay),
            SALARY,
            month_end(),
        );

        let day = &summary.days[0];
        assert_close(day.regular_hours, 8.0);
        assert_close(day.day_credit, 1.0);
        assert_close(summary.basic_pay, 1000.0);
    }

    #[test]
    fn actual_hours_policy_pays_by_the_hour() {
        // One full 8h day plus one incomplete day assumed at 4h.
        let punches = [
            punch(2, 9, 0, LogType::In),
            punch(2, 17, 0, LogType::Out),
            punch(3, 9, 0, LogType::In),
        ];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::ActualHours),
            SALARY,
            month_end(),
        );

        assert_close(summary.total_regular_hours, 12.0);
        // 12h at the 125 hourly rate, not day-credit based.
        assert_close(summary.basic_pay, 1500.0);
        let incomplete = &summary.days[1];
        assert_close(incomplete.day_credit, 0.5); // 4h / 8h
    }

    #[test]
    fn ongoing_day_uses_now_as_provisional_out() {
        let punches = [punch(5, 9, 0, LogType::In)];
        // 4h elapsed on the current day: under the full-day minimum.
        let now = ts(5, 13, 0);
        let summary = summarize(&punches, &rules(IncompleteDayPolicy::NoPay), SALARY, now);

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::Ongoing);
        assert_close(day.worked_hours, 4.0);
        assert_close(day.day_credit, 0.5);
    }

    #[test]
    fn ongoing_day_past_threshold_earns_full_provisional_credit() {
        let punches = [punch(5, 9, 0, LogType::In)];
        let now = ts(5, 19, 0); // 10h elapsed
        let summary = summarize(&punches, &rules(IncompleteDayPolicy::NoPay), SALARY, now);

        let day = &summary.days[0];
        assert_eq!(day.status, DayStatus::Ongoing);
        assert_close(day.regular_hours, 8.0);
        assert_close(day.overtime_hours, 2.0);
        assert_close(day.day_credit, 1.0);
    }

    #[test]
    fn duplicate_punches_reduce_to_first_in_last_out() {
        let punches = [
            punch(2, 9, 0, LogType::In),
            punch(2, 9, 1, LogType::In),
            punch(2, 12, 0, LogType::Out),
            punch(2, 18, 0, LogType::Out),
        ];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        assert_eq!(summary.days.len(), 1);
        assert_close(summary.days[0].worked_hours, 9.0);
    }

    #[test]
    fn dangling_out_day_is_absent_from_output() {
        let punches = [punch(2, 8, 0, LogType::Out)];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );
        assert!(summary.days.is_empty());
    }

    #[test]
    fn month_of_mixed_days_adds_up() {
        let punches = [
            // 9h with overtime
            punch(2, 9, 0, LogType::In),
            punch(2, 18, 0, LogType::Out),
            // 7h plain full day
            punch(3, 9, 0, LogType::In),
            punch(3, 16, 0, LogType::Out),
            // 4h half day
            punch(4, 9, 0, LogType::In),
            punch(4, 13, 0, LogType::Out),
            // incomplete past day
            punch(5, 9, 0, LogType::In),
        ];
        let summary = summarize(
            &punches,
            &rules(IncompleteDayPolicy::HalfDay),
            SALARY,
            month_end(),
        );

        assert_eq!(summary.days.len(), 4);
        assert_close(summary.total_regular_hours, 8.0 + 7.0 + 4.0 + 4.0);
        assert_close(summary.total_overtime_hours, 1.0);
        assert_close(summary.total_day_credits, 1.0 + 1.0 + 0.5 + 0.5);
        assert_close(summary.basic_pay, 3000.0);
        assert_close(summary.overtime_pay, 187.5);
        assert_close(summary.total_pay, 3187.5);
    }

    proptest! {
        // Pay never decreases when a closed day gets longer.
        #[test]
        fn pay_is_monotone_in_elapsed_hours(
            // Out-punch stays on the same calendar day (06:00 + at most 17h).
            minutes_a in 0i64..=720,
            extra in 0i64..=300,
        ) {
            let rules = rules(IncompleteDayPolicy::HalfDay);
            let shorter = [
                punch(2, 6, 0, LogType::In),
                Punch { at: ts(2, 6, 0) + chrono::Duration::minutes(minutes_a), kind: LogType::Out },
            ];
            let longer = [
                punch(2, 6, 0, LogType::In),
                Punch { at: ts(2, 6, 0) + chrono::Duration::minutes(minutes_a + extra), kind: LogType::Out },
            ];

            let pay_short = summarize(&shorter, &rules, SALARY, month_end()).total_pay;
            let pay_long = summarize(&longer, &rules, SALARY, month_end()).total_pay;
            prop_assert!(pay_long >= pay_short - 1e-9);
        }
    }
}
