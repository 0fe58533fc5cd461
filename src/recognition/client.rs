use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

use super::error::RecognitionError;

/// One subject candidate returned for a detected face.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectMatch {
    pub subject: String,
    /// Match similarity in [0, 1].
    pub similarity: f64,
}

/// One detected face region with its candidate subjects.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedFace {
    #[serde(default)]
    pub subjects: Vec<SubjectMatch>,
    /// Detection confidence in [0, 1].
    #[serde(default)]
    pub det_probability: f64,
}

#[derive(Deserialize)]
struct FaceListResponse {
    #[serde(default)]
    result: Vec<DetectedFace>,
}

#[derive(Deserialize)]
struct EnrollResponse {
    image_id: String,
}

#[derive(Deserialize)]
struct SubjectsResponse {
    #[serde(default)]
    subjects: Vec<String>,
}

/// HTTP client for a CompreFace-style recognition service.
///
/// Every request carries the `x-api-key` header and the configured timeout;
/// failures surface as [`RecognitionError`] and are never retried here.
#[derive(Clone)]
pub struct RecognitionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// `det_prob_threshold` forwarded to the service on uploads.
    detection_threshold: f64,
}

impl RecognitionClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        detection_threshold: f64,
    ) -> Result<Self, RecognitionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            detection_threshold,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn image_form(image_jpeg: Vec<u8>) -> Result<multipart::Form, RecognitionError> {
        let part = multipart::Part::bytes(image_jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")?;
        Ok(multipart::Form::new().part("file", part))
    }

    /// Detects face regions in an image without matching them. Used at
    /// enrollment, which requires exactly one face in frame.
    pub async fn detect(&self, image_jpeg: Vec<u8>) -> Result<Vec<DetectedFace>, RecognitionError> {
        let response = self
            .http
            .post(self.url("/detection/detect"))
            .header("x-api-key", &self.api_key)
            .query(&[("det_prob_threshold", self.detection_threshold.to_string())])
            .multipart(Self::image_form(image_jpeg)?)
            .send()
            .await?;

        let body: FaceListResponse = Self::check(response).await?.json().await?;
        debug!(faces = body.result.len(), "detection completed");
        Ok(body.result)
    }

    /// Enrolls a face sample under `subject` and returns the image id the
    /// service assigned to it.
    pub async fn enroll(
        &self,
        subject: &str,
        image_jpeg: Vec<u8>,
    ) -> Result<String, RecognitionError> {
        let response = self
            .http
            .post(self.url("/recognition/faces"))
            .header("x-api-key", &self.api_key)
            .query(&[
                ("subject", subject.to_string()),
                ("det_prob_threshold", self.detection_threshold.to_string()),
            ])
            .multipart(Self::image_form(image_jpeg)?)
            .send()
            .await?;

        let body: EnrollResponse = Self::check(response).await?.json().await?;
        debug!(subject, image_id = %body.image_id, "face enrolled");
        Ok(body.image_id)
    }

    /// Matches an image against the enrolled gallery. Zero detected faces
    /// or zero subject candidates are normal outcomes, not errors.
    pub async fn recognize(
        &self,
        image_jpeg: Vec<u8>,
    ) -> Result<Vec<DetectedFace>, RecognitionError> {
        let response = self
            .http
            .post(self.url("/recognition/recognize"))
            .header("x-api-key", &self.api_key)
            .query(&[
                ("limit", "1".to_string()),
                ("det_prob_threshold", self.detection_threshold.to_string()),
            ])
            .multipart(Self::image_form(image_jpeg)?)
            .send()
            .await?;

        let body: FaceListResponse = Self::check(response).await?.json().await?;
        Ok(body.result)
    }

    /// Removes every sample enrolled under `subject`.
    pub async fn delete_subject(&self, subject: &str) -> Result<(), RecognitionError> {
        let response = self
            .http
            .delete(self.url(&format!("/recognition/subjects/{subject}")))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        Self::check(response).await?;
        debug!(subject, "subject deleted");
        Ok(())
    }

    /// Lists enrolled subject keys. Used by the enrollment-consistency
    /// debug endpoint to compare the gallery against the database.
    pub async fn list_subjects(&self) -> Result<Vec<String>, RecognitionError> {
        let response = self
            .http
            .get(self.url("/recognition/subjects"))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let body: SubjectsResponse = Self::check(response).await?.json().await?;
        Ok(body.subjects)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RecognitionError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(RecognitionError::Service { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = RecognitionClient::new("http://faces:8000/", "key", 30, 0.8).unwrap();
        assert_eq!(
            client.url("/recognition/recognize"),
            "http://faces:8000/api/v1/recognition/recognize"
        );
    }

    #[test]
    fn recognize_response_parses_service_shape() {
        let raw = r#"{
            "result": [
                {
                    "subjects": [{"subject": "emp_EMP-001", "similarity": 0.98}],
                    "det_probability": 0.993
                }
            ]
        }"#;
        let parsed: FaceListResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result.len(), 1);
        assert_eq!(parsed.result[0].subjects[0].subject, "emp_EMP-001");
        assert!((parsed.result[0].subjects[0].similarity - 0.98).abs() < 1e-9);
    }

    #[test]
    fn missing_result_field_means_no_faces() {
        let parsed: FaceListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.result.is_empty());
    }
}
