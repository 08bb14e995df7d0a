//! Prediction service client

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::outcome::{CallStage, SubmissionError};
use crate::core::payload::SubmissionPayload;

/// Liveness probe path
pub const HEALTH_PATH: &str = "/ipo/health";

/// Submission path
pub const PREDICT_PATH: &str = "/ipo/predict-immediately";

/// Longest error body kept in a failure message
const MAX_ERROR_BODY: usize = 500;

/// The remote prediction service, as seen by the orchestrator
pub trait PredictionService: Send + Sync {
    /// Cheap pre-flight check; any 2xx is healthy
    fn health_check(&self) -> Result<(), SubmissionError>;

    /// Submit the payload and return the raw response body
    fn predict(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError>;
}

/// HTTP implementation over a blocking reqwest client
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPredictionClient {
    /// Create a client for the service at `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Connectivity {
                stage: CallStage::Probe,
                message: format!("could not build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, stage: CallStage, err: reqwest::Error) -> SubmissionError {
        if err.is_timeout() {
            SubmissionError::Timeout {
                stage,
                seconds: self.timeout.as_secs(),
            }
        } else {
            SubmissionError::Connectivity {
                stage,
                message: err.to_string(),
            }
        }
    }

    fn check_status(&self, stage: CallStage, response: Response) -> Result<Response, SubmissionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
            body.push_str("...");
        }
        warn!(%stage, status = status.as_u16(), "service returned an error status");
        Err(SubmissionError::Status {
            stage,
            status: status.as_u16(),
            body,
        })
    }
}

impl PredictionService for HttpPredictionClient {
    fn health_check(&self) -> Result<(), SubmissionError> {
        let url = self.url(HEALTH_PATH);
        debug!(%url, "probing prediction service");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.transport_error(CallStage::Probe, e))?;
        self.check_status(CallStage::Probe, response)?;
        Ok(())
    }

    fn predict(&self, payload: &SubmissionPayload) -> Result<Value, SubmissionError> {
        let url = self.url(PREDICT_PATH);
        debug!(%url, company = %payload.company_name, "submitting prediction request");
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .map_err(|e| self.transport_error(CallStage::Predict, e))?;
        let response = self.check_status(CallStage::Predict, response)?;

        let text = response
            .text()
            .map_err(|e| self.transport_error(CallStage::Predict, e))?;
        serde_json::from_str(&text).map_err(|e| {
            SubmissionError::MalformedResponse(format!("response body is not JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wizard::AccumulatedData;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    const UNAVAILABLE: &str =
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndown";
    const PLAIN_TEXT: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
    const PREDICTION: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 43\r\nConnection: close\r\n\r\n{\"prediction\":{\"predictedOfferPrice\":12.5}}";

    /// Local HTTP server answering every request with `response`.
    /// With `None` connections are accepted but never answered.
    fn serve(response: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                read_request(&mut stream);
                match response {
                    Some(reply) => {
                        let _ = stream.write_all(reply.as_bytes());
                    }
                    None => held.push(stream),
                }
            }
        });
        format!("http://{}", addr)
    }

    /// Consume request headers and body so the reply is not reset
    fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let mut received = buf.len() - end - 4;
                while received < length {
                    let n = stream.read(&mut chunk).unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    received += n;
                }
                return;
            }
        }
    }

    fn payload() -> SubmissionPayload {
        SubmissionPayload::from_accumulated_in_year(&AccumulatedData::new(), 2024)
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpPredictionClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(HEALTH_PATH), "http://localhost:8000/ipo/health");
        assert_eq!(
            client.url(PREDICT_PATH),
            "http://localhost:8000/ipo/predict-immediately"
        );
    }

    #[test]
    fn test_refused_connection_is_connectivity_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let client =
            HttpPredictionClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = client.health_check().unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Connectivity { stage: CallStage::Probe, .. }
        ));
        assert_eq!(err.kind(), "connectivity");
    }

    #[test]
    fn test_silent_service_times_out() {
        let client = HttpPredictionClient::new(&serve(None), Duration::from_secs(1)).unwrap();
        let err = client.health_check().unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Timeout {
                stage: CallStage::Probe,
                seconds: 1
            }
        );
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_error_status_is_reported_with_body() {
        let client = HttpPredictionClient::new(&serve(Some(UNAVAILABLE)), Duration::from_secs(5)).unwrap();
        let err = client.health_check().unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Status {
                stage: CallStage::Probe,
                status: 503,
                body: "down".to_string()
            }
        );
        assert_eq!(err.kind(), "http_status");

        let err = client.predict(&payload()).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Status { stage: CallStage::Predict, status: 503, .. }
        ));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let client = HttpPredictionClient::new(&serve(Some(PLAIN_TEXT)), Duration::from_secs(5)).unwrap();
        client.health_check().unwrap();
        let err = client.predict(&payload()).unwrap_err();
        assert!(matches!(err, SubmissionError::MalformedResponse(_)));
        assert_eq!(err.kind(), "malformed_response");
    }

    #[test]
    fn test_json_body_is_returned() {
        let client = HttpPredictionClient::new(&serve(Some(PREDICTION)), Duration::from_secs(5)).unwrap();
        let body = client.predict(&payload()).unwrap();
        assert_eq!(body["prediction"]["predictedOfferPrice"], 12.5);
    }
}
