use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    model::face_image::FaceImage,
    recognition::RecognitionClient,
    utils::db_utils::{build_update_sql, execute_update},
    utils::identity_filter,
    utils::image::decode_image_payload,
    utils::subject_cache,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

/// Columns a partial update may touch. `employee_code` and `subject_name`
/// are fixed at enrollment; changing them would desync the recognition
/// service's subject gallery.
const UPDATABLE_COLUMNS: &[&str] = &[
    "full_name",
    "email",
    "phone",
    "department",
    "designation",
    "date_joined",
    "monthly_salary",
    "is_active",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Software Engineer")]
    pub designation: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date_joined: NaiveDate,
    #[schema(example = 22000.0)]
    pub monthly_salary: f64,
    /// Captured face sample as a base64 data URL; enrollment requires
    /// exactly one face in frame.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQ...")]
    pub image_data: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct AddFace {
    /// Additional face sample as a base64 data URL
    pub image_data: String,
}

/// Partial update payload; mirrors [`UPDATABLE_COLUMNS`].
#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date_joined: Option<NaiveDate>,
    pub monthly_salary: Option<f64>,
    pub is_active: Option<bool>,
}

/// Enroll Employee
///
/// Creates the employee row and enrolls the captured face with the
/// recognition service in one transaction: if enrollment fails, the row is
/// rolled back and no partially-created employee remains.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee enrolled", body = Object, example = json!({
            "message": "Employee enrolled successfully", "id": 7
        })),
        (status = 400, description = "Validation failure (missing image, zero or multiple faces)"),
        (status = 409, description = "Duplicate employee code or email"),
        (status = 502, description = "Recognition service failure"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    recognizer: web::Data<RecognitionClient>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please capture at least one photo"
        })));
    }

    let image = match decode_image_payload(&payload.image_data) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Image payload is not valid base64: {e}")
            })));
        }
    };

    // Fast-path duplicate check; the filter only proves absence, so a hit
    // still goes to the database.
    if identity_filter::might_exist(&payload.employee_code)
        || identity_filter::might_exist(&payload.email)
    {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ? OR email = ? LIMIT 1)",
        )
        .bind(&payload.employee_code)
        .bind(&payload.email)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Duplicate check failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

        if taken {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "Employee with this code or email already exists"
            })));
        }
    }

    // Enrollment needs exactly one face in frame.
    let faces = match recognizer.detect(image.clone()).await {
        Ok(faces) => faces,
        Err(e) => {
            warn!(error = %e, "Detection call failed during enrollment");
            return Ok(HttpResponse::BadGateway().json(json!({
                "message": format!("Recognition failed: {e}")
            })));
        }
    };

    if faces.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No face detected in the image. Please ensure your face is clearly visible."
        })));
    }
    if faces.len() > 1 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!(
                "Multiple faces detected ({} faces). Please ensure only one person is in the frame.",
                faces.len()
            )
        })));
    }

    let subject_name = format!("emp_{}", payload.employee_code);

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let insert = sqlx::query(
        r#"
        INSERT INTO employees
        (subject_name, employee_code, full_name, email, phone, department, designation, date_joined, monthly_salary)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&subject_name)
    .bind(&payload.employee_code)
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.designation)
    .bind(payload.date_joined)
    .bind(payload.monthly_salary)
    .execute(&mut *tx)
    .await;

    let employee_id = match insert {
        Ok(result) => result.last_insert_id(),
        Err(e) => {
            // Unique-index race with the filter pre-check
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Employee with this code or email already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to insert employee");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    // External enrollment inside the transaction boundary: a failure here
    // rolls the row back, so enrollment is at-most-once.
    let image_id = match recognizer.enroll(&subject_name, image).await {
        Ok(image_id) => image_id,
        Err(e) => {
            warn!(error = %e, subject = %subject_name, "Face enrollment failed, rolling back");
            if let Err(rb) = tx.rollback().await {
                error!(error = %rb, "Rollback failed");
            }
            return Ok(HttpResponse::BadGateway().json(json!({
                "message": format!("Failed to add face to recognition system: {e}")
            })));
        }
    };

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO face_images (employee_id, image_id, is_primary)
        VALUES (?, ?, TRUE)
        "#,
    )
    .bind(employee_id)
    .bind(&image_id)
    .execute(&mut *tx)
    .await
    {
        error!(error = %e, "Failed to insert face image reference");
        let _ = tx.rollback().await;
        return Err(ErrorInternalServerError("Internal Server Error"));
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit enrollment");
        ErrorInternalServerError("Internal Server Error")
    })?;

    identity_filter::insert(&payload.employee_code);
    identity_filter::insert(&payload.email);
    subject_cache::remember(&subject_name, employee_id).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee enrolled successfully",
        "id": employee_id
    })))
}

/// Add Face
///
/// Enrolls an additional sample for an existing employee under their
/// established subject key.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/faces",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = AddFace,
    responses(
        (status = 200, description = "Face added"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Employee not found"),
        (status = 502, description = "Recognition service failure")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_face(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    recognizer: web::Data<RecognitionClient>,
    path: web::Path<u64>,
    payload: web::Json<AddFace>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    if payload.image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please capture a photo"
        })));
    }

    let image = match decode_image_payload(&payload.image_data) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Image payload is not valid base64: {e}")
            })));
        }
    };

    let subject_name = sqlx::query_scalar::<_, String>(
        "SELECT subject_name FROM employees WHERE id = ? AND is_active = TRUE",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(subject_name) = subject_name else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let faces = match recognizer.detect(image.clone()).await {
        Ok(faces) => faces,
        Err(e) => {
            warn!(error = %e, "Detection call failed while adding face");
            return Ok(HttpResponse::BadGateway().json(json!({
                "message": format!("Recognition failed: {e}")
            })));
        }
    };

    if faces.len() != 1 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Expected exactly one face in the frame, found {}", faces.len())
        })));
    }

    let image_id = match recognizer.enroll(&subject_name, image).await {
        Ok(image_id) => image_id,
        Err(e) => {
            warn!(error = %e, subject = %subject_name, "Face enrollment failed");
            return Ok(HttpResponse::BadGateway().json(json!({
                "message": format!("Failed to add face: {e}")
            })));
        }
    };

    sqlx::query(
        r#"
        INSERT INTO face_images (employee_id, image_id, is_primary)
        VALUES (?, ?, FALSE)
        "#,
    )
    .bind(employee_id)
    .bind(&image_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to insert face image reference");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Face added successfully"
    })))
}

/// List Enrolled Faces
///
/// The face samples registered for an employee, primary sample first.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}/faces",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Enrolled face references", body = [FaceImage]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_faces(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let faces = sqlx::query_as::<_, FaceImage>(
        r#"
        SELECT *
        FROM face_images
        WHERE employee_id = ?
        ORDER BY is_primary DESC, created_at ASC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch face images");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(faces))
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(
        ("page",  Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("department", Query, description = "Filter by department"),
        ("is_active", Query, description = "Filter by active flag"),
        ("search", Query, description = "Search by name, email or code")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(department.clone().into());
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(is_active.into());
    }

    if let Some(search) = &query.search {
        conditions.push("(full_name LIKE ? OR email LIKE ? OR employee_code LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Unknown or read-only field in payload"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    if let Some(email) = body.get("email").and_then(|v| v.as_str()) {
        identity_filter::insert(email);
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Deactivate Employee
///
/// Deletes the subject from the recognition service, then soft-deletes the
/// employee so historical attendance logs survive.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated"),
        (status = 404, description = "Employee not found"),
        (status = 502, description = "Recognition service failure"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    recognizer: web::Data<RecognitionClient>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let subject_name = sqlx::query_scalar::<_, String>(
        "SELECT subject_name FROM employees WHERE id = ? AND is_active = TRUE",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(subject_name) = subject_name else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    // External delete first; if it fails the employee stays active.
    if let Err(e) = recognizer.delete_subject(&subject_name).await {
        warn!(error = %e, subject = %subject_name, "Subject delete failed");
        return Ok(HttpResponse::BadGateway().json(json!({
            "message": format!("Failed to delete from recognition system: {e}")
        })));
    }

    sqlx::query("UPDATE employees SET is_active = FALSE WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to deactivate employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    subject_cache::forget(&subject_name).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated"
    })))
}
