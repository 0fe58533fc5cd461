use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::attendance::{AttendanceSummary, LogType, Punch, summarize};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance_log::AttendanceLog;
use crate::recognition::RecognitionClient;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month to report on as `YYYY-MM`; defaults to the current month
    #[schema(example = "2026-03")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema, sqlx::FromRow)]
pub struct TodayAttendance {
    pub employee_id: u64,
    pub full_name: String,
    #[schema(value_type = String, format = "date-time")]
    pub first_in: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub last_out: NaiveDateTime,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeAttendanceResponse {
    pub employee_id: u64,
    pub full_name: String,
    pub month: String,
    pub logs: Vec<AttendanceLogEntry>,
    pub summary: AttendanceSummary,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceLogEntry {
    pub id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    pub log_type: String,
    pub similarity_score: f64,
    pub confidence_score: f64,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyReportRow {
    pub employee_id: u64,
    pub employee_code: String,
    pub full_name: String,
    pub department: String,
    pub monthly_salary: f64,
    pub total_day_credits: f64,
    pub total_regular_hours: f64,
    pub total_overtime_hours: f64,
    pub basic_pay: f64,
    pub overtime_pay: f64,
    pub total_pay: f64,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyReportResponse {
    pub month: String,
    pub employees: Vec<MonthlyReportRow>,
}

/// Half-open UTC datetime range covering a `YYYY-MM` month string.
fn month_bounds(month: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let (year_str, month_str) = month.split_once('-')?;
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;

    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some((
        start.and_hms_opt(0, 0, 0)?,
        end.and_hms_opt(0, 0, 0)?,
    ))
}

fn requested_month(query: &MonthQuery) -> String {
    query.month.clone().unwrap_or_else(|| {
        let today = Utc::now().date_naive();
        format!("{:04}-{:02}", today.year(), today.month())
    })
}

/// Rows -> aggregator input. Unknown log types are skipped, not fatal.
fn to_punches(logs: &[AttendanceLog]) -> Vec<Punch> {
    logs.iter()
        .filter_map(|log| match LogType::from_str(&log.log_type) {
            Ok(kind) => Some(Punch {
                at: log.timestamp,
                kind,
            }),
            Err(_) => {
                warn!(log_id = log.id, log_type = %log.log_type, "Skipping unknown log type");
                None
            }
        })
        .collect()
}

async fn fetch_month_logs(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<AttendanceLog>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceLog>(
        r#"
        SELECT *
        FROM attendance_logs
        WHERE employee_id = ? AND timestamp >= ? AND timestamp < ?
        ORDER BY timestamp ASC
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Today's attendance summary
///
/// First and last punch of the current day per employee, for the dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Per-employee first/last punch today", body = [TodayAttendance]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let today = Utc::now().date_naive();
    let start = today.and_hms_opt(0, 0, 0).unwrap();
    let end = start + chrono::Duration::days(1);

    let rows = sqlx::query_as::<_, TodayAttendance>(
        r#"
        SELECT e.id AS employee_id,
               e.full_name AS full_name,
               MIN(a.timestamp) AS first_in,
               MAX(a.timestamp) AS last_out
        FROM employees e
        JOIN attendance_logs a ON a.employee_id = e.id
        WHERE a.timestamp >= ? AND a.timestamp < ?
        GROUP BY e.id, e.full_name
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch today's attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Monthly attendance detail for one employee
///
/// Raw logs for the month plus the aggregator's per-day breakdown, hour
/// totals, and pay figures. Employees can read their own record; HR and
/// admin can read anyone's.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}/attendance",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Attendance detail", body = EmployeeAttendanceResponse),
        (status = 400, description = "Malformed month"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Own record only"));
    }

    let month = requested_month(&query);
    let Some((start, end)) = month_bounds(&month) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Month must be formatted as YYYY-MM"
        })));
    };

    let employee = sqlx::query_as::<_, (String, f64)>(
        "SELECT full_name, monthly_salary FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some((full_name, monthly_salary)) = employee else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        })));
    };

    let logs = fetch_month_logs(pool.get_ref(), employee_id, start, end)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch attendance logs");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let summary = summarize(
        &to_punches(&logs),
        &config.payroll,
        monthly_salary,
        Utc::now().naive_utc(),
    );

    Ok(HttpResponse::Ok().json(EmployeeAttendanceResponse {
        employee_id,
        full_name,
        month,
        logs: logs
            .into_iter()
            .map(|log| AttendanceLogEntry {
                id: log.id,
                timestamp: log.timestamp,
                log_type: log.log_type,
                similarity_score: log.similarity_score,
                confidence_score: log.confidence_score,
            })
            .collect(),
        summary,
    }))
}

#[derive(sqlx::FromRow)]
struct ReportEmployee {
    id: u64,
    employee_code: String,
    full_name: String,
    department: String,
    monthly_salary: f64,
}

/// Monthly payroll report
///
/// Aggregator totals and computed pay for every active employee.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(MonthQuery),
    responses(
        (status = 200, description = "Payroll report", body = MonthlyReportResponse),
        (status = 400, description = "Malformed month")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn monthly_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let month = requested_month(&query);
    let Some((start, end)) = month_bounds(&month) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Month must be formatted as YYYY-MM"
        })));
    };

    let employees = sqlx::query_as::<_, ReportEmployee>(
        r#"
        SELECT id, employee_code, full_name, department, monthly_salary
        FROM employees
        WHERE is_active = TRUE
        ORDER BY employee_code
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees for report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let now = Utc::now().naive_utc();
    let mut rows = Vec::with_capacity(employees.len());

    for employee in employees {
        let logs = fetch_month_logs(pool.get_ref(), employee.id, start, end)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = employee.id, "Failed to fetch attendance logs");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        let summary = summarize(&to_punches(&logs), &config.payroll, employee.monthly_salary, now);

        rows.push(MonthlyReportRow {
            employee_id: employee.id,
            employee_code: employee.employee_code,
            full_name: employee.full_name,
            department: employee.department,
            monthly_salary: employee.monthly_salary,
            total_day_credits: summary.total_day_credits,
            total_regular_hours: summary.total_regular_hours,
            total_overtime_hours: summary.total_overtime_hours,
            basic_pay: summary.basic_pay,
            overtime_pay: summary.overtime_pay,
            total_pay: summary.total_pay,
        });
    }

    Ok(HttpResponse::Ok().json(MonthlyReportResponse {
        month,
        employees: rows,
    }))
}

#[derive(sqlx::FromRow, Serialize)]
struct SubjectRow {
    id: u64,
    employee_code: String,
    full_name: String,
    subject_name: String,
}

/// Enrollment consistency check
///
/// Compares the recognition service's subject gallery against active
/// employees; a mismatch means an enrollment or delete went missing.
#[utoipa::path(
    get,
    path = "/api/v1/debug/subjects",
    responses(
        (status = 200, description = "Gallery subjects and database employees"),
        (status = 502, description = "Recognition service failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn debug_subjects(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    recognizer: web::Data<RecognitionClient>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let gallery = match recognizer.list_subjects().await {
        Ok(subjects) => subjects,
        Err(e) => {
            warn!(error = %e, "Failed to list gallery subjects");
            return Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "message": format!("Recognition failed: {e}")
            })));
        }
    };

    let employees = sqlx::query_as::<_, SubjectRow>(
        r#"
        SELECT id, employee_code, full_name, subject_name
        FROM employees
        WHERE is_active = TRUE
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "gallery_subjects": gallery,
        "database_employees": employees,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_month_half_open() {
        let (start, end) = month_bounds("2026-03").unwrap();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (_, end) = month_bounds("2025-12").unwrap();
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn malformed_months_are_rejected() {
        assert!(month_bounds("2026").is_none());
        assert!(month_bounds("2026-13").is_none());
        assert!(month_bounds("march").is_none());
    }
}
