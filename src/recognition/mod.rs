//! Outbound client for the external face-recognition service. The service
//! owns detection, embedding, and matching; this crate only consumes its
//! REST API (detect / enroll / recognize / delete subject) and never
//! reimplements any of it.

mod client;
mod error;

pub use client::{DetectedFace, RecognitionClient, SubjectMatch};
pub use error::RecognitionError;
