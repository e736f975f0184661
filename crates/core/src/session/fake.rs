//! In-memory transport for lifecycle tests.

use crate::session::transport::{ConnectRequest, InboundEvent, OutboundEvent, RealtimeTransport, TransportLink};
use crate::tools::ToolResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// The service's end of one fake link.
pub(crate) struct Remote {
    pub inbound: mpsc::Sender<InboundEvent>,
    pub outbound: mpsc::Receiver<OutboundEvent>,
}

impl Remote {
    pub async fn call(&self, call_id: &str, name: &str, arguments: &str) {
        self.inbound
            .send(InboundEvent::FunctionCall {
                call_id: call_id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            })
            .await
            .unwrap();
    }

    /// Next function output, skipping narration and response requests.
    pub async fn next_output(&mut self) -> (String, ToolResult) {
        loop {
            match self.outbound.recv().await {
                Some(OutboundEvent::FunctionOutput { call_id, output }) => {
                    return (call_id, serde_json::from_str(&output).unwrap());
                }
                Some(_) => continue,
                None => panic!("link closed while waiting for a function output"),
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    attempts: AtomicUsize,
    refuse_first: usize,
    never_ready: bool,
    fault_after_ready: Option<String>,
    pub requests: Mutex<Vec<ConnectRequest>>,
    remotes: Mutex<Vec<Remote>>,
}

impl FakeTransport {
    pub fn refusing(refuse_first: usize) -> Self {
        Self {
            refuse_first,
            ..Self::default()
        }
    }

    /// Accepts connections but never acknowledges the session.
    pub fn never_ready() -> Self {
        Self {
            never_ready: true,
            ..Self::default()
        }
    }

    /// Acknowledges the session and then immediately reports `message` as
    /// a link fault.
    pub fn faulting_after_ready(message: &str) -> Self {
        Self {
            fault_after_ready: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Takes the oldest link that has not been taken yet.
    pub fn remote(&self) -> Remote {
        self.remotes.lock().unwrap().remove(0)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RealtimeTransport for FakeTransport {
    async fn connect(&self, request: ConnectRequest) -> anyhow::Result<TransportLink> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request);
        if attempt <= self.refuse_first {
            anyhow::bail!("connection refused");
        }
        let (in_tx, in_rx) = mpsc::channel(64);
        let (out_tx, out_rx) = mpsc::channel(64);
        if !self.never_ready {
            in_tx.send(InboundEvent::Ready).await?;
        }
        if let Some(message) = &self.fault_after_ready {
            in_tx.send(InboundEvent::Fault(message.clone())).await?;
        }
        self.remotes.lock().unwrap().push(Remote {
            inbound: in_tx,
            outbound: out_rx,
        });
        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
