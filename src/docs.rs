use crate::api::employee::{
    AddFace, CreateEmployee, EmployeeListResponse, EmployeeQuery, UpdateEmployee,
};
use crate::api::punch::{PunchEmployee, PunchRequest, PunchResponse};
use crate::api::report::{
    AttendanceLogEntry, EmployeeAttendanceResponse, MonthQuery, MonthlyReportResponse,
    MonthlyReportRow, TodayAttendance,
};
use crate::attendance::{
    AttendanceSummary, DayRecord, DayStatus, IncompleteDayPolicy, LogType, PayrollRules,
};
use crate::model::employee::Employee;
use crate::model::face_image::FaceImage;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Faceclock API",
        version = "1.0.0",
        description = r#"
## Face-Recognition Attendance & Payroll

This API powers an employee attendance tracker that authenticates punches
through an external face-recognition service and derives payroll figures
from the resulting clock-in/clock-out logs.

### Key Features
- **Employee Enrollment**
  - Create employees with a captured face sample; add further samples later
- **Punch Capture**
  - Clock IN/OUT by camera frame, gated by similarity threshold and cooldown
- **Attendance & Payroll**
  - Per-day session reconstruction, overtime split, day credits, and
    salary under a configurable incomplete-day policy

### Security
Endpoints are protected using **JWT Bearer authentication**. Enrollment and
reports require **Admin** or **HR** roles; punching only needs a logged-in
terminal account.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::add_face,
        crate::api::employee::list_faces,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::punch::clock,

        crate::api::report::today_summary,
        crate::api::report::employee_attendance,
        crate::api::report::monthly_report,
        crate::api::report::debug_subjects
    ),
    components(
        schemas(
            CreateEmployee,
            UpdateEmployee,
            AddFace,
            EmployeeQuery,
            Employee,
            EmployeeListResponse,
            FaceImage,
            PunchRequest,
            PunchResponse,
            PunchEmployee,
            MonthQuery,
            TodayAttendance,
            AttendanceLogEntry,
            EmployeeAttendanceResponse,
            MonthlyReportRow,
            MonthlyReportResponse,
            AttendanceSummary,
            DayRecord,
            DayStatus,
            IncompleteDayPolicy,
            LogType,
            PayrollRules
        )
    ),
    tags(
        (name = "Employee", description = "Employee enrollment and management APIs"),
        (name = "Punch", description = "Face-recognition punch capture APIs"),
        (name = "Attendance", description = "Attendance detail APIs"),
        (name = "Reports", description = "Payroll report APIs"),
    )
)]
pub struct ApiDoc;
