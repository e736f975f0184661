//! What the session manager needs from a realtime speech service.
//!
//! A transport opens one link per session. The manager reads
//! [`InboundEvent`]s until the link ends and writes [`OutboundEvent`]s;
//! dropping every outbound sender closes the link.

use crate::session::log::TokenUsage;
use async_trait::async_trait;
use openai_realtime_types::audio::{Base64EncodedAudioBytes, Voice};
use openai_realtime_types::tools::Tool;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub voice: Voice,
    pub instructions: String,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The remote side accepted the session configuration and tools.
    Ready,
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// The service heard the user start talking.
    SpeechStarted,
    /// A chunk of the assistant's spoken reply.
    AudioDelta(Base64EncodedAudioBytes),
    UserTranscript(String),
    AssistantMessage(String),
    /// Usage of one finished response.
    Usage(TokenUsage),
    /// Usage summed over every response on this link so far.
    TokenTotals(TokenUsage),
    /// Reported by the service. The session carries on.
    ServerError(String),
    Closed {
        reason: Option<String>,
    },
    /// The link broke.
    Fault(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A chunk of captured microphone audio.
    Audio(Base64EncodedAudioBytes),
    UserText(String),
    FunctionOutput { call_id: String, output: String },
    CreateResponse,
}

pub struct TransportLink {
    pub outbound: mpsc::Sender<OutboundEvent>,
    pub inbound: mpsc::Receiver<InboundEvent>,
}

#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self, request: ConnectRequest) -> anyhow::Result<TransportLink>;
}
