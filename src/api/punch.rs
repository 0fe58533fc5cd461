use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::attendance::{LogType, in_cooldown, similarity_ok};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::recognition::RecognitionClient;
use crate::utils::image::decode_image_payload;
use crate::utils::subject_cache;

#[derive(Deserialize, ToSchema)]
pub struct PunchRequest {
    /// Camera capture as a base64 data URL
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQ...")]
    pub image: String,

    #[serde(rename = "type")]
    #[schema(example = "IN")]
    pub log_type: LogType,
}

#[derive(Serialize, ToSchema)]
pub struct PunchEmployee {
    pub name: String,
    pub employee_code: String,
    pub department: String,
}

/// Outcome of a punch attempt. `success = false` covers the normal
/// negative outcomes (no face, unknown face, below threshold, cooldown);
/// those are not errors.
#[derive(Serialize, ToSchema)]
pub struct PunchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<PunchEmployee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_type: Option<LogType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<String>,
}

impl PunchResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            employee: None,
            log_type: None,
            timestamp: None,
            similarity: None,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PunchTarget {
    id: u64,
    full_name: String,
    employee_code: String,
    department: String,
    is_active: bool,
}

/// Clock IN/OUT via face recognition
#[utoipa::path(
    post,
    path = "/api/v1/punch",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Punch evaluated; check `success`", body = PunchResponse),
        (status = 400, description = "Missing or undecodable image"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Recognition service failure"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Punch"
)]
pub async fn clock(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    recognizer: web::Data<RecognitionClient>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    if payload.image.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No image provided"
        })));
    }

    let image = match decode_image_payload(&payload.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": format!("Image payload is not valid base64: {e}")
            })));
        }
    };

    // 1. Recognition: transport/service failure aborts, nothing persisted.
    let faces = match recognizer.recognize(image).await {
        Ok(faces) => faces,
        Err(e) => {
            warn!(error = %e, "Recognition call failed during punch");
            return Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "message": format!("Recognition failed: {e}")
            })));
        }
    };

    let Some(face) = faces.first() else {
        return Ok(HttpResponse::Ok().json(PunchResponse::rejected(
            "No face detected in the image. Please ensure your face is clearly visible.",
        )));
    };

    let Some(best) = face.subjects.first() else {
        return Ok(HttpResponse::Ok().json(PunchResponse::rejected(
            "Face detected but not recognized. Please ensure you are registered in the system.",
        )));
    };

    // 2. Similarity gate.
    if !similarity_ok(best.similarity, config.similarity_threshold) {
        return Ok(HttpResponse::Ok().json(PunchResponse::rejected(format!(
            "Face not recognized with sufficient confidence (similarity: {:.2}%)",
            best.similarity * 100.0
        ))));
    }

    // 3. Subject -> employee, cache first.
    let employee = match find_employee(pool.get_ref(), &best.subject).await {
        Ok(Some(emp)) => emp,
        Ok(None) => {
            return Ok(HttpResponse::Ok().json(PunchResponse::rejected(format!(
                "Employee not found for subject: {}",
                best.subject
            ))));
        }
        Err(e) => {
            error!(error = %e, subject = %best.subject, "Employee lookup failed");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    let now = Utc::now().naive_utc();

    // 4. Cooldown against the most recent log of the same type.
    let last_same_type = sqlx::query_scalar::<_, NaiveDateTime>(
        r#"
        SELECT timestamp
        FROM attendance_logs
        WHERE employee_id = ? AND log_type = ?
        ORDER BY timestamp DESC
        LIMIT 1
        "#,
    )
    .bind(employee.id)
    .bind(payload.log_type.to_string())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = employee.id, "Cooldown lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(previous) = last_same_type {
        if in_cooldown(previous, now, config.punch_cooldown_minutes) {
            return Ok(HttpResponse::Ok().json(PunchResponse::rejected(format!(
                "Already clocked {} recently. Please wait {} minutes.",
                payload.log_type.to_string().to_lowercase(),
                config.punch_cooldown_minutes
            ))));
        }
    }

    // 5. All gates passed: this is the only write.
    sqlx::query(
        r#"
        INSERT INTO attendance_logs
        (employee_id, timestamp, log_type, similarity_score, confidence_score)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(now)
    .bind(payload.log_type.to_string())
    .bind(best.similarity)
    .bind(face.det_probability)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = employee.id, "Failed to insert attendance log");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(
        employee_id = employee.id,
        log_type = %payload.log_type,
        similarity = best.similarity,
        "Punch accepted"
    );

    Ok(HttpResponse::Ok().json(PunchResponse {
        success: true,
        message: None,
        employee: Some(PunchEmployee {
            name: employee.full_name,
            employee_code: employee.employee_code,
            department: employee.department,
        }),
        log_type: Some(payload.log_type),
        timestamp: Some(now),
        similarity: Some(format!("{:.2}%", best.similarity * 100.0)),
    }))
}

/// Resolves a recognition subject to an active employee, going through the
/// subject cache before the database.
async fn find_employee(pool: &MySqlPool, subject: &str) -> Result<Option<PunchTarget>, sqlx::Error> {
    if let Some(id) = subject_cache::lookup(subject).await {
        let row = sqlx::query_as::<_, PunchTarget>(
            r#"
            SELECT id, full_name, employee_code, department, is_active
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(emp) if emp.is_active => return Ok(Some(emp)),
            // Stale mapping: employee deactivated since it was cached.
            _ => subject_cache::forget(subject).await,
        }
    }

    let row = sqlx::query_as::<_, PunchTarget>(
        r#"
        SELECT id, full_name, employee_code, department, is_active
        FROM employees
        WHERE subject_name = ? AND is_active = TRUE
        "#,
    )
    .bind(subject)
    .fetch_optional(pool)
    .await?;

    if let Some(emp) = &row {
        subject_cache::remember(subject, emp.id).await;
    }

    Ok(row)
}
