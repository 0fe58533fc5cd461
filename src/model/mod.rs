pub mod attendance_log;
pub mod employee;
pub mod face_image;
pub mod role;
