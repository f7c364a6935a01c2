//! Conversion between exchange outcomes and stored records

use std::collections::VecDeque;

use crate::network::{ErrorKind, Outcome, TransportError};
use crate::{PlaybackError, Result};

use super::format::{ErrorSnapshot, ExchangeRecord, RequestSnapshot, ResponseSnapshot};

/// Capture an outcome as a record
#[must_use]
pub fn encode(outcome: &Outcome) -> ExchangeRecord {
    match outcome {
        Ok(response) => ExchangeRecord::Success(ResponseSnapshot::capture(response)),
        Err(err) => ExchangeRecord::Error(ErrorSnapshot {
            error_class: err.kind().id().to_string(),
            error_message: err.message().to_string(),
            request: RequestSnapshot::capture(err.request()),
            response: Some(
                err.response()
                    .map_or_else(ResponseSnapshot::sentinel, ResponseSnapshot::capture),
            ),
        }),
    }
}

/// Capture a sequence of outcomes, preserving order
pub fn encode_all<'a, I>(outcomes: I) -> Vec<ExchangeRecord>
where
    I: IntoIterator<Item = &'a Outcome>,
{
    outcomes.into_iter().map(encode).collect()
}

/// Rebuild the outcome a record describes
///
/// Errors of a response-bearing kind get their stored response back; for
/// any other kind the stored response snapshot is ignored.
///
/// # Errors
///
/// Returns error if the error kind is not registered or the record content is invalid
pub fn decode(record: &ExchangeRecord) -> Result<Outcome> {
    match record {
        ExchangeRecord::Success(response) => Ok(Ok(response.restore()?)),
        ExchangeRecord::Error(error) => {
            let kind = ErrorKind::from_id(&error.error_class)
                .ok_or_else(|| PlaybackError::UnknownErrorKind(error.error_class.clone()))?;
            let request = error.request.restore()?;

            let response = if kind.carries_response() {
                error
                    .response
                    .as_ref()
                    .ok_or_else(|| {
                        PlaybackError::MalformedRecording(format!(
                            "'{}' error record is missing its response",
                            error.error_class
                        ))
                    })?
                    .restore()?
            } else {
                ResponseSnapshot::sentinel().restore()?
            };

            Ok(Err(TransportError::rebuild(
                kind,
                error.error_message.as_str(),
                request,
                response,
            )))
        }
    }
}

/// Rebuild a queue of outcomes from records, preserving order
///
/// # Errors
///
/// Returns the first decoding error
pub fn decode_all(records: &[ExchangeRecord]) -> Result<VecDeque<Outcome>> {
    records.iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Headers, Request, Response};
    use hyper::Method;
    use proptest::prelude::*;

    fn request() -> Request {
        Request::new(Method::POST, "http://localhost/widgets")
            .with_header("Content-Type", "application/json")
            .with_body("{\"name\":\"gear\"}")
    }

    #[test]
    fn test_encode_success() {
        let outcome: Outcome = Ok(Response::new(200).with_header("X-Total", "1").with_body("{}"));

        match encode(&outcome) {
            ExchangeRecord::Success(snapshot) => {
                assert_eq!(snapshot.status_code, 200);
                assert_eq!(snapshot.headers.first("x-total"), Some("1"));
                assert_eq!(snapshot.body, "{}");
            }
            ExchangeRecord::Error(_) => panic!("expected a success record"),
        }
    }

    #[test]
    fn test_encode_error_without_response_uses_sentinel() {
        let outcome: Outcome = Err(TransportError::connect("refused", request()));

        match encode(&outcome) {
            ExchangeRecord::Error(snapshot) => {
                assert_eq!(snapshot.error_class, "connect");
                assert_eq!(snapshot.error_message, "refused");
                assert_eq!(snapshot.request.method, "POST");
                assert_eq!(snapshot.request.body, "{\"name\":\"gear\"}");
                assert_eq!(snapshot.response, Some(ResponseSnapshot::sentinel()));
            }
            ExchangeRecord::Success(_) => panic!("expected an error record"),
        }
    }

    #[test]
    fn test_error_round_trip_keeps_response() {
        let original: Outcome = Err(TransportError::from_status(
            request(),
            Response::new(404).with_body("missing"),
        ));

        let decoded = decode(&encode(&original)).unwrap();
        assert_eq!(decoded, original);

        let err = decoded.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.response().unwrap().text(), "missing");
    }

    #[test]
    fn test_decode_branches_on_family_not_presence() {
        // Response snapshot present but kind is not response-bearing
        let record = ExchangeRecord::Error(ErrorSnapshot {
            error_class: "timeout".to_string(),
            error_message: "slow".to_string(),
            request: RequestSnapshot::capture(&request()),
            response: Some(ResponseSnapshot::capture(&Response::new(504))),
        });
        let err = decode(&record).unwrap().unwrap_err();
        assert!(err.response().is_none());

        // Response-bearing kind without a snapshot
        let record = ExchangeRecord::Error(ErrorSnapshot {
            error_class: "server".to_string(),
            error_message: "boom".to_string(),
            request: RequestSnapshot::capture(&request()),
            response: None,
        });
        assert!(matches!(
            decode(&record),
            Err(PlaybackError::MalformedRecording(_))
        ));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let record = ExchangeRecord::Error(ErrorSnapshot {
            error_class: "GuzzleHttp\\Exception\\TransferException".to_string(),
            error_message: "nope".to_string(),
            request: RequestSnapshot::capture(&request()),
            response: None,
        });

        match decode(&record) {
            Err(PlaybackError::UnknownErrorKind(id)) => {
                assert_eq!(id, "GuzzleHttp\\Exception\\TransferException");
            }
            other => panic!("expected unknown error kind, got {other:?}"),
        }
    }

    fn arb_headers() -> impl Strategy<Value = Headers> {
        prop::collection::vec(
            ("[A-Za-z][A-Za-z-]{0,8}", prop::collection::vec("[ -~]{0,12}", 1..3)),
            0..4,
        )
        .prop_map(|entries| {
            let mut headers = Headers::new();
            for (name, values) in entries {
                headers.insert(name, values);
            }
            headers
        })
    }

    fn arb_body() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            "[ -~]{0,32}".prop_map(String::into_bytes),
            prop::collection::vec(any::<u8>(), 0..32),
        ]
    }

    fn arb_outcome() -> impl Strategy<Value = Outcome> {
        let kinds: Vec<ErrorKind> = ErrorKind::all().collect();
        prop_oneof![
            (100u16..600, arb_headers(), arb_body()).prop_map(|(status, headers, body)| {
                Ok(Response {
                    status,
                    headers,
                    body: body.into(),
                })
            }),
            (
                prop::sample::select(kinds),
                "[ -~]{0,24}",
                "/[a-z]{0,8}",
                arb_headers(),
                arb_body(),
                400u16..600,
                arb_body(),
            )
                .prop_map(|(kind, message, uri, headers, body, status, response_body)| {
                    let request = Request {
                        method: Method::PUT,
                        uri,
                        headers,
                        body: body.into(),
                    };
                    Err(TransportError::rebuild(
                        kind,
                        message,
                        request,
                        Response::new(status).with_body(response_body),
                    ))
                }),
        ]
    }

    proptest! {
        #[test]
        fn prop_encode_decode_preserves_outcomes(
            outcomes in prop::collection::vec(arb_outcome(), 0..8)
        ) {
            let records = encode_all(&outcomes);
            let json = serde_json::to_vec(&records).unwrap();
            let parsed: Vec<ExchangeRecord> = serde_json::from_slice(&json).unwrap();
            let decoded = decode_all(&parsed).unwrap();

            prop_assert_eq!(decoded.into_iter().collect::<Vec<_>>(), outcomes);
        }
    }
}
