//! Shared fixtures for engine integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use docsum_engine::config::UploadConfig;
use docsum_engine::exporter::{ArtifactExporter, DirectorySink, FixedClock, MemoryNotifier};
use docsum_engine::session::Session;
use docsum_engine::transport::{
    Endpoint, Form, Response, ResponseKind, Result as TransportResult, Transport, TransportError,
};

/// Timestamp every test export is named with
pub const NOW_MILLIS: i64 = 1_700_000_000_000;

/// A request the transport received
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: Endpoint,
    pub form: Option<Form>,
    pub kind: ResponseKind,
}

/// Transport answering from a script of per-endpoint replies
///
/// Calls to a gated endpoint are recorded immediately, then held until the
/// test adds a permit to the gate.
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<Vec<(Endpoint, TransportResult<Response>)>>,
    gate: Option<(Endpoint, Arc<Semaphore>)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call to `endpoint` until a permit is added
    pub fn gated(endpoint: Endpoint) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self {
            gate: Some((endpoint, Arc::clone(&gate))),
            ..Self::default()
        };
        (transport, gate)
    }

    pub fn reply(&self, endpoint: Endpoint, reply: TransportResult<Response>) {
        self.replies.lock().unwrap().push((endpoint, reply));
    }

    pub fn reply_json(&self, endpoint: Endpoint, body: Value) {
        self.reply(endpoint, Ok(Response::Json(body)));
    }

    pub fn reply_bytes(&self, endpoint: Endpoint, bytes: &[u8]) {
        self.reply(endpoint, Ok(Response::Binary(bytes.to_vec())));
    }

    pub fn fail(&self, endpoint: Endpoint, error: TransportError) {
        self.reply(endpoint, Err(error));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Wait until `count` calls have been recorded
    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("transport was never called");
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<Form>,
        kind: ResponseKind,
    ) -> TransportResult<Response> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            form: payload,
            kind,
        });

        if let Some((gated, gate)) = &self.gate {
            if *gated == endpoint {
                gate.acquire().await.expect("gate closed").forget();
            }
        }

        let mut replies = self.replies.lock().unwrap();
        match replies.iter().position(|(e, _)| *e == endpoint) {
            Some(idx) => replies.remove(idx).1,
            None => Err(TransportError::network(format!(
                "no scripted reply for {}",
                endpoint
            ))),
        }
    }
}

/// Session over `transport`, saving into `dir` at a fixed time
pub fn session_with(
    transport: &Arc<ScriptedTransport>,
    dir: &Path,
) -> (Arc<Session>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    let exporter = ArtifactExporter::new(
        Arc::clone(&transport),
        Arc::new(DirectorySink::new(dir)),
        Arc::new(FixedClock(NOW_MILLIS)),
        Arc::clone(&notifier) as Arc<dyn docsum_engine::exporter::Notifier>,
    );
    let session = Session::new(transport, exporter, UploadConfig::default());
    (Arc::new(session), notifier)
}
