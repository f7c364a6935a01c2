//! Scripted transport for unit tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{Outcome, Request, RequestOptions, Transport, TransportError};

/// Transport that answers with a fixed list of outcomes and remembers what it was sent
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    sent: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedTransport {
    pub(crate) fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, shared with the test
    pub(crate) fn sent(&self) -> Arc<Mutex<Vec<Request>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request, _options: &RequestOptions) -> Outcome {
        self.sent.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connect("script exhausted", request)))
    }

    fn config(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("base_uri".to_string(), Value::from("http://fake.test"));
        map.insert("http_errors".to_string(), Value::Bool(true));
        map
    }
}
