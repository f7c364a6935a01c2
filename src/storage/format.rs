//! Recording file format
//!
//! A recording is a JSON array of exchange records. A record is either a
//! successful response or a transport error, told apart by the `error` flag:
//!
//! ```json
//! [
//!   {"error": false, "statusCode": 200, "headers": {"X-Total": ["1"]}, "body": "{\"id\":1}"},
//!   {"error": true, "errorClass": "client", "errorMessage": "...",
//!    "request": {"method": "GET", "uri": "...", "headers": {}, "body": ""},
//!    "response": {"statusCode": 404, "headers": {}, "body": ""}}
//! ]
//! ```
//!
//! Bodies that are not valid UTF-8 are stored base64-encoded and marked with
//! `"bodyEncoding": "base64"`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use hyper::Method;
use serde::{Deserialize, Serialize};

use crate::network::{Headers, Request, Response};
use crate::{PlaybackError, Result};

/// Status written for errors that carry no response
pub const SENTINEL_STATUS: u16 = 500;

/// How a stored body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// Standard base64
    Base64,
}

fn store_body(body: &[u8]) -> (String, Option<BodyEncoding>) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), None),
        Err(_) => (STANDARD.encode(body), Some(BodyEncoding::Base64)),
    }
}

fn restore_body(body: &str, encoding: Option<BodyEncoding>) -> Result<Bytes> {
    match encoding {
        None => Ok(Bytes::copy_from_slice(body.as_bytes())),
        Some(BodyEncoding::Base64) => STANDARD
            .decode(body)
            .map(Bytes::from)
            .map_err(|e| PlaybackError::MalformedRecording(format!("Invalid base64 body: {e}"))),
    }
}

/// Stored response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body
    #[serde(default)]
    pub body: String,
    /// Encoding of `body`, absent for UTF-8 text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<BodyEncoding>,
}

impl ResponseSnapshot {
    /// Capture a response
    #[must_use]
    pub fn capture(response: &Response) -> Self {
        let (body, body_encoding) = store_body(&response.body);
        Self {
            status_code: response.status,
            headers: response.headers.clone(),
            body,
            body_encoding,
        }
    }

    /// Placeholder stored for errors without a response
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            status_code: SENTINEL_STATUS,
            headers: Headers::new(),
            body: String::new(),
            body_encoding: None,
        }
    }

    /// Rebuild the response
    ///
    /// # Errors
    ///
    /// Returns error if the body encoding is invalid
    pub fn restore(&self) -> Result<Response> {
        Ok(Response {
            status: self.status_code,
            headers: self.headers.clone(),
            body: restore_body(&self.body, self.body_encoding)?,
        })
    }
}

/// Stored request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    /// HTTP method
    pub method: String,
    /// Request URI
    pub uri: String,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: String,
    /// Encoding of `body`, absent for UTF-8 text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<BodyEncoding>,
}

impl RequestSnapshot {
    /// Capture a request
    #[must_use]
    pub fn capture(request: &Request) -> Self {
        let (body, body_encoding) = store_body(&request.body);
        Self {
            method: request.method.to_string(),
            uri: request.uri.clone(),
            headers: request.headers.clone(),
            body,
            body_encoding,
        }
    }

    /// Rebuild the request
    ///
    /// # Errors
    ///
    /// Returns error if the method or the body encoding is invalid
    pub fn restore(&self) -> Result<Request> {
        let method = Method::from_bytes(self.method.as_bytes()).map_err(|_| {
            PlaybackError::MalformedRecording(format!("Invalid HTTP method '{}'", self.method))
        })?;

        Ok(Request {
            method,
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            body: restore_body(&self.body, self.body_encoding)?,
        })
    }
}

/// Stored transport error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSnapshot {
    /// Error kind identifier
    pub error_class: String,
    /// Error message
    pub error_message: String,
    /// Request that failed
    pub request: RequestSnapshot,
    /// Response, or the sentinel when the error carried none
    pub response: Option<ResponseSnapshot>,
}

/// One persisted exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub enum ExchangeRecord {
    /// Successful response
    Success(ResponseSnapshot),
    /// Transport error
    Error(ErrorSnapshot),
}

/// Flat on-disk shape of a record
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_encoding: Option<BodyEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request: Option<RequestSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<ResponseSnapshot>,
}

impl TryFrom<RawRecord> for ExchangeRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, String> {
        if !raw.error {
            let status_code = raw
                .status_code
                .ok_or("success record is missing `statusCode`")?;
            return Ok(Self::Success(ResponseSnapshot {
                status_code,
                headers: raw.headers.unwrap_or_default(),
                body: raw.body.unwrap_or_default(),
                body_encoding: raw.body_encoding,
            }));
        }

        Ok(ExchangeRecord::Error(ErrorSnapshot {
            error_class: raw
                .error_class
                .ok_or("error record is missing `errorClass`")?,
            error_message: raw.error_message.unwrap_or_default(),
            request: raw.request.ok_or("error record is missing `request`")?,
            response: raw.response,
        }))
    }
}

impl From<ExchangeRecord> for RawRecord {
    fn from(record: ExchangeRecord) -> Self {
        match record {
            ExchangeRecord::Success(response) => Self {
                error: false,
                status_code: Some(response.status_code),
                headers: Some(response.headers),
                body: Some(response.body),
                body_encoding: response.body_encoding,
                error_class: None,
                error_message: None,
                request: None,
                response: None,
            },
            ExchangeRecord::Error(error) => Self {
                error: true,
                status_code: None,
                headers: None,
                body: None,
                body_encoding: None,
                error_class: Some(error.error_class),
                error_message: Some(error.error_message),
                request: Some(error.request),
                response: error.response,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_record_json_shape() {
        let record = ExchangeRecord::Success(ResponseSnapshot::capture(
            &Response::new(200)
                .with_header("Content-Type", "application/json")
                .with_body("{\"id\":1}"),
        ));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "error": false,
                "statusCode": 200,
                "headers": {"Content-Type": ["application/json"]},
                "body": "{\"id\":1}"
            })
        );
    }

    #[test]
    fn test_error_record_json_shape() {
        let record = ExchangeRecord::Error(ErrorSnapshot {
            error_class: "connect".to_string(),
            error_message: "Connection refused".to_string(),
            request: RequestSnapshot::capture(&Request::new(Method::GET, "http://localhost/")),
            response: Some(ResponseSnapshot::sentinel()),
        });

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "error": true,
                "errorClass": "connect",
                "errorMessage": "Connection refused",
                "request": {"method": "GET", "uri": "http://localhost/", "headers": {}, "body": ""},
                "response": {"statusCode": 500, "headers": {}, "body": ""}
            })
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_records() {
        let missing_status = r#"[{"error": false, "headers": {}, "body": ""}]"#;
        assert!(serde_json::from_str::<Vec<ExchangeRecord>>(missing_status).is_err());

        let missing_class = r#"[{"error": true, "request": {"method": "GET", "uri": "/"}}]"#;
        assert!(serde_json::from_str::<Vec<ExchangeRecord>>(missing_class).is_err());

        let missing_flag = r#"[{"statusCode": 200}]"#;
        assert!(serde_json::from_str::<Vec<ExchangeRecord>>(missing_flag).is_err());
    }

    #[test]
    fn test_binary_body_is_base64() {
        let snapshot = ResponseSnapshot::capture(&Response::new(200).with_body(vec![0xff, 0x00, 0xfe]));
        assert_eq!(snapshot.body_encoding, Some(BodyEncoding::Base64));
        assert_eq!(snapshot.body, "/wD+");

        let restored = snapshot.restore().unwrap();
        assert_eq!(restored.body.as_ref(), &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let snapshot = ResponseSnapshot {
            body: "not base64!".to_string(),
            body_encoding: Some(BodyEncoding::Base64),
            ..ResponseSnapshot::sentinel()
        };
        assert!(matches!(
            snapshot.restore(),
            Err(PlaybackError::MalformedRecording(_))
        ));
    }

    #[test]
    fn test_invalid_method_is_malformed() {
        let snapshot = RequestSnapshot {
            method: "GE T".to_string(),
            uri: "/".to_string(),
            headers: Headers::new(),
            body: String::new(),
            body_encoding: None,
        };
        assert!(matches!(
            snapshot.restore(),
            Err(PlaybackError::MalformedRecording(_))
        ));
    }
}
