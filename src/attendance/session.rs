use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::policy::LogType;

/// A single punch, already restricted to one employee. Timestamps are UTC.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Punch {
    pub at: NaiveDateTime,
    pub kind: LogType,
}

/// The reconstructed work session for one calendar day: the day's first
/// punch-in and, if one exists after it, the day's last punch-out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DaySession {
    pub date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
}

/// Groups punches by calendar day and reduces each day to one session.
///
/// The reduction rule is explicit: the **first** IN of the day opens the
/// session and the **last** OUT closes it. Duplicate INs after the first
/// and OUTs before the last are ignored rather than rejected. An OUT at or
/// before the day's first IN is dangling and is discarded; a day whose only
/// punches are dangling OUTs produces no session at all.
///
/// Days come back in ascending date order. Punches are expected ordered by
/// timestamp (the query ordering), but the reduction itself only depends on
/// per-day min/max so unordered input degrades gracefully.
pub fn reconstruct_sessions(punches: &[Punch]) -> Vec<DaySession> {
    let mut days: BTreeMap<NaiveDate, (Option<NaiveDateTime>, Option<NaiveDateTime>)> =
        BTreeMap::new();

    for punch in punches {
        let slot = days.entry(punch.at.date()).or_insert((None, None));
        match punch.kind {
            LogType::In => {
                if slot.0.map_or(true, |first| punch.at < first) {
                    slot.0 = Some(punch.at);
                }
            }
            LogType::Out => {
                if slot.1.map_or(true, |last| punch.at > last) {
                    slot.1 = Some(punch.at);
                }
            }
        }
    }

    days.into_iter()
        .filter_map(|(date, (first_in, last_out))| {
            let clock_in = first_in?;
            let clock_out = last_out.filter(|out| *out > clock_in);
            Some(DaySession {
                date,
                clock_in,
                clock_out,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn punch(day: u32, hour: u32, min: u32, kind: LogType) -> Punch {
        Punch {
            at: at(day, hour, min),
            kind,
        }
    }

    #[test]
    fn empty_input_gives_no_sessions() {
        assert!(reconstruct_sessions(&[]).is_empty());
    }

    #[test]
    fn single_in_and_out_make_one_session() {
        let sessions = reconstruct_sessions(&[
            punch(2, 9, 0, LogType::In),
            punch(2, 18, 0, LogType::Out),
        ]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].clock_in, at(2, 9, 0));
        assert_eq!(sessions[0].clock_out, Some(at(2, 18, 0)));
    }

    #[test]
    fn first_in_wins_and_last_out_wins() {
        let sessions = reconstruct_sessions(&[
            punch(2, 9, 0, LogType::In),
            punch(2, 9, 5, LogType::In),
            punch(2, 13, 0, LogType::Out),
            punch(2, 18, 0, LogType::Out),
        ]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].clock_in, at(2, 9, 0));
        assert_eq!(sessions[0].clock_out, Some(at(2, 18, 0)));
    }

    #[test]
    fn out_before_any_in_is_dropped() {
        // OUT at 08:00 precedes the first IN, so the session is open.
        let sessions = reconstruct_sessions(&[
            punch(2, 8, 0, LogType::Out),
            punch(2, 9, 0, LogType::In),
        ]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].clock_in, at(2, 9, 0));
        assert_eq!(sessions[0].clock_out, None);
    }

    #[test]
    fn day_with_only_dangling_outs_yields_nothing() {
        let sessions = reconstruct_sessions(&[
            punch(2, 8, 0, LogType::Out),
            punch(2, 17, 0, LogType::Out),
        ]);
        assert!(sessions.is_empty());
    }

    #[test]
    fn days_are_split_and_ordered() {
        let sessions = reconstruct_sessions(&[
            punch(4, 9, 0, LogType::In),
            punch(4, 17, 0, LogType::Out),
            punch(2, 9, 30, LogType::In),
            punch(2, 18, 0, LogType::Out),
        ]);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(sessions[1].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn in_only_day_stays_open() {
        let sessions = reconstruct_sessions(&[punch(2, 9, 0, LogType::In)]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].clock_out, None);
    }
}
