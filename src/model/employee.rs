use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "subject_name": "emp_EMP-001",
        "employee_code": "EMP-001",
        "full_name": "John Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "designation": "Software Engineer",
        "date_joined": "2024-01-01",
        "monthly_salary": 22000.0,
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Key correlating this employee with the recognition service's
    /// subject gallery. Derived as `emp_{employee_code}` at enrollment.
    #[schema(example = "emp_EMP-001")]
    pub subject_name: String,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Software Engineer")]
    pub designation: String,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub date_joined: NaiveDate,

    #[schema(example = 22000.0)]
    pub monthly_salary: f64,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
