//! Lifecycle of the realtime voice session.
//!
//! `Idle -> Connecting -> Active -> Ended`, with `Error` reachable from
//! `Connecting` (connect attempts exhausted) and `Active` (link fault).
//! Public operations never return transport errors; callers watch the status.
//!
//! While a session is active one event loop reads the inbound side of the
//! link. Each function call is dispatched on its own task, so a slow network
//! tool never holds up the next call or the rest of the conversation. Every
//! call produces exactly one result in the log, one notification and one
//! `FunctionOutput` followed by `CreateResponse` on the link.
//!
//! Audio bypasses dispatch entirely. Captured chunks go straight onto the
//! outbound queue with [`SessionManager::send_audio`] and the assistant's
//! speech fans out to [`SessionManager::subscribe_audio`].

#[cfg(test)]
pub(crate) mod fake;
mod log;
mod openai;
mod transport;

pub use log::{LogContent, LogEntry, MessageLog, Role, TokenUsage};
pub use openai::OpenAiTransport;
pub use transport::{ConnectRequest, InboundEvent, OutboundEvent, RealtimeTransport, TransportLink};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::notify::{Notification, Notifier};
use crate::presentation::NarrationSink;
use crate::tools::{ToolCatalog, ToolFunctions, ToolResult};
use anyhow::Context;
use openai_realtime_types::audio::{Base64EncodedAudioBytes, Voice};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Active,
    Ended,
    Error(String),
}

impl SessionStatus {
    /// Connecting or active.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Connecting | SessionStatus::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::Error(_) => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Error(reason) => write!(f, "error: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Audio a front end plays or reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAudio {
    /// The user started talking over the assistant.
    SpeechStarted,
    Output(Base64EncodedAudioBytes),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handles of a running session, owned by the lifecycle lock.
struct LiveSession {
    shutdown: CancellationToken,
    abort: CancellationToken,
    tracker: TaskTracker,
    event_loop: JoinHandle<()>,
}

struct Inner {
    transport: Arc<dyn RealtimeTransport>,
    tools: ToolFunctions,
    catalog: ToolCatalog,
    notifier: Notifier,
    config: SessionConfig,
    voice: Mutex<Voice>,
    status: watch::Sender<SessionStatus>,
    // Serialises start, stop and restart.
    lifecycle: tokio::sync::Mutex<Option<LiveSession>>,
    connecting: Mutex<Option<CancellationToken>>,
    outbound: Mutex<Option<mpsc::Sender<OutboundEvent>>>,
    log: Mutex<Arc<MessageLog>>,
    audio: broadcast::Sender<SessionAudio>,
    totals: Mutex<TokenUsage>,
    generation: AtomicU64,
}

impl Inner {
    fn set_status(&self, next: SessionStatus) {
        let mut previous = None;
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            previous = Some(std::mem::replace(current, next.clone()));
            true
        });
        if let Some(previous) = previous {
            tracing::info!(from = %previous, to = %next, "session status changed");
        }
    }

    async fn connect(&self, request: ConnectRequest) -> anyhow::Result<TransportLink> {
        let attempts = self.config.max_connect_attempts.max(1);
        let mut last_error = anyhow::anyhow!("no connection attempt was made");
        for attempt in 1..=attempts {
            match self.try_connect(request.clone()).await {
                Ok(link) => {
                    tracing::info!(attempt, "realtime session ready");
                    return Ok(link);
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, "realtime connect failed: {:#}", e);
                    last_error = e;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.reconnect_delay).await;
                    }
                }
            }
        }
        Err(last_error.context(format!("gave up after {attempts} connection attempts")))
    }

    async fn try_connect(&self, request: ConnectRequest) -> anyhow::Result<TransportLink> {
        let mut link = tokio::time::timeout(self.config.ready_timeout, self.transport.connect(request))
            .await
            .context("timed out opening the realtime link")??;
        tokio::time::timeout(self.config.ready_timeout, wait_ready(&mut link.inbound))
            .await
            .context("timed out waiting for the session to be ready")??;
        Ok(link)
    }

    /// Called by the event loop when the link ends on its own.
    fn finish(&self, generation: u64, status: SessionStatus) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        lock(&self.outbound).take();
        match &status {
            SessionStatus::Error(reason) => {
                tracing::error!("voice session lost: {}", reason);
                self.notifier.publish(Notification::error("Voice session lost", reason));
            }
            _ => self.notifier.publish(Notification::info("Voice session ended", "The assistant closed the conversation.")),
        }
        self.set_status(status);
    }

    /// Stops reading the link, gives in-flight calls `flush_timeout` to report
    /// back, cancels the rest and then releases the link.
    async fn shut_down(&self, live: LiveSession) {
        live.shutdown.cancel();
        if let Err(e) = live.event_loop.await {
            tracing::error!("session event loop failed: {}", e);
        }
        live.tracker.close();
        if tokio::time::timeout(self.config.flush_timeout, live.tracker.wait()).await.is_err() {
            tracing::warn!(pending = live.tracker.len(), "tool calls still running at stop, cancelling them");
            live.abort.cancel();
            live.tracker.wait().await;
        }
        lock(&self.outbound).take();
    }
}

async fn wait_ready(inbound: &mut mpsc::Receiver<InboundEvent>) -> anyhow::Result<()> {
    while let Some(event) = inbound.recv().await {
        match event {
            InboundEvent::Ready => return Ok(()),
            InboundEvent::ServerError(message) => anyhow::bail!("rejected by the service: {message}"),
            InboundEvent::Closed { reason } => {
                anyhow::bail!("closed before ready: {}", reason.as_deref().unwrap_or("no reason given"))
            }
            InboundEvent::Fault(message) => anyhow::bail!("link failed before ready: {message}"),
            other => tracing::debug!(?other, "ignoring event before ready"),
        }
    }
    anyhow::bail!("link ended before the session was ready")
}

/// Owns one realtime session at a time. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        tools: ToolFunctions,
        catalog: ToolCatalog,
        notifier: Notifier,
        config: SessionConfig,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::Idle);
        let (audio, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                transport,
                tools,
                catalog,
                notifier,
                voice: Mutex::new(config.voice.clone()),
                config,
                status,
                lifecycle: tokio::sync::Mutex::new(None),
                connecting: Mutex::new(None),
                outbound: Mutex::new(None),
                log: Mutex::new(Arc::new(MessageLog::new())),
                audio,
                totals: Mutex::new(TokenUsage::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_active(&self) -> bool {
        *self.inner.status.borrow() == SessionStatus::Active
    }

    /// Voice used by the next session.
    pub fn voice(&self) -> Voice {
        lock(&self.inner.voice).clone()
    }

    pub fn set_voice(&self, voice: Voice) {
        *lock(&self.inner.voice) = voice;
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.inner.catalog
    }

    pub fn subscribe_audio(&self) -> broadcast::Receiver<SessionAudio> {
        self.inner.audio.subscribe()
    }

    /// Tokens used by the current (or most recent) session, as counted by
    /// the transport.
    pub fn token_totals(&self) -> TokenUsage {
        *lock(&self.inner.totals)
    }

    /// Log of the current (or most recent) session.
    pub fn log(&self) -> Arc<MessageLog> {
        lock(&self.inner.log).clone()
    }

    /// Opens a session with `voice` and the catalog's tools. Does nothing
    /// while a session is connecting or active. Returns the resulting status.
    pub async fn start(&self, voice: Voice) -> SessionStatus {
        let mut live = self.inner.lifecycle.lock().await;
        let current = self.status();
        if current.is_live() {
            tracing::debug!(status = %current, "start ignored, a session is already running");
            return current;
        }
        if let Some(stale) = live.take() {
            self.inner.shut_down(stale).await;
        }

        self.set_voice(voice.clone());
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let log = Arc::new(MessageLog::new());
        *lock(&self.inner.log) = log.clone();
        *lock(&self.inner.totals) = TokenUsage::default();
        let cancel = CancellationToken::new();
        *lock(&self.inner.connecting) = Some(cancel.clone());
        self.inner.set_status(SessionStatus::Connecting);

        let request = ConnectRequest {
            voice,
            instructions: self.inner.config.instructions.clone(),
            tools: self.inner.catalog.function_tools(),
        };
        tracing::info!(voice = %request.voice, tools = request.tools.len(), generation, "starting voice session");
        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            outcome = self.inner.connect(request) => Some(outcome),
        };
        lock(&self.inner.connecting).take();

        match outcome {
            Some(Ok(link)) => {
                *live = Some(self.activate(generation, link, log));
            }
            Some(Err(e)) => {
                tracing::error!("voice session failed to start: {:#}", e);
                let reason = format!("{e:#}");
                self.inner
                    .notifier
                    .publish(Notification::error("Voice session failed", &reason));
                self.inner.set_status(SessionStatus::Error(reason));
            }
            None => {
                tracing::info!("voice session start cancelled");
                self.inner.set_status(SessionStatus::Ended);
            }
        }
        self.status()
    }

    fn activate(&self, generation: u64, link: TransportLink, log: Arc<MessageLog>) -> LiveSession {
        let TransportLink { outbound, inbound } = link;
        *lock(&self.inner.outbound) = Some(outbound.clone());

        let shutdown = CancellationToken::new();
        let abort = CancellationToken::new();
        let tracker = TaskTracker::new();
        let event_loop = EventLoop {
            inner: Arc::downgrade(&self.inner),
            generation,
            inbound,
            outbound,
            log,
            tools: self.inner.tools.clone(),
            notifier: self.inner.notifier.clone(),
            audio: self.inner.audio.clone(),
            shutdown: shutdown.clone(),
            abort: abort.clone(),
            tracker: tracker.clone(),
        };
        // Must precede the spawn: once the loop runs, only it may move the
        // status on from `Active`.
        self.inner.set_status(SessionStatus::Active);
        self.inner
            .notifier
            .publish(Notification::info("Voice session started", "The assistant is listening."));
        LiveSession {
            shutdown,
            abort,
            tracker,
            event_loop: tokio::spawn(event_loop.run()),
        }
    }

    /// Tears the session down and leaves the status `Ended`. Safe to call
    /// any number of times, including while a start is still connecting.
    pub async fn stop(&self) -> SessionStatus {
        if let Some(connecting) = lock(&self.inner.connecting).take() {
            connecting.cancel();
        }
        let mut live = self.inner.lifecycle.lock().await;
        if let Some(session) = live.take() {
            tracing::info!("stopping voice session");
            self.inner.shut_down(session).await;
            self.inner
                .notifier
                .publish(Notification::info("Voice session ended", "The voice session was stopped."));
        }
        self.inner.set_status(SessionStatus::Ended);
        self.status()
    }

    /// Stops any running session, then starts a new one.
    pub async fn restart(&self, voice: Voice) -> SessionStatus {
        self.stop().await;
        self.start(voice).await
    }

    fn active_outbound(&self) -> Result<mpsc::Sender<OutboundEvent>, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        lock(&self.inner.outbound).clone().ok_or(SessionError::NotActive)
    }

    /// Adds a user utterance to the conversation and asks for a reply.
    pub async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        let outbound = self.active_outbound()?;
        outbound
            .send(OutboundEvent::UserText(text.to_string()))
            .await
            .map_err(|_| SessionError::NotActive)?;
        outbound
            .send(OutboundEvent::CreateResponse)
            .await
            .map_err(|_| SessionError::NotActive)?;
        self.log().user_text(text);
        Ok(())
    }

    /// Queues one chunk of captured audio without waiting. A full queue
    /// drops the chunk and reports it.
    pub fn send_audio(&self, audio: Base64EncodedAudioBytes) -> Result<(), SessionError> {
        self.active_outbound()?
            .try_send(OutboundEvent::Audio(audio))
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    /// Same as [`send_text`](Self::send_text) without waiting for channel
    /// capacity. Fails if the outbound queue is full.
    pub fn try_send_text(&self, text: &str) -> Result<(), SessionError> {
        let outbound = self.active_outbound()?;
        outbound
            .try_send(OutboundEvent::UserText(text.to_string()))
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        outbound
            .try_send(OutboundEvent::CreateResponse)
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        self.log().user_text(text);
        Ok(())
    }
}

impl NarrationSink for SessionManager {
    fn is_active(&self) -> bool {
        SessionManager::is_active(self)
    }

    fn send_narration(&self, text: &str) -> Result<(), SessionError> {
        self.try_send_text(text)
    }
}

struct EventLoop {
    inner: Weak<Inner>,
    generation: u64,
    inbound: mpsc::Receiver<InboundEvent>,
    outbound: mpsc::Sender<OutboundEvent>,
    log: Arc<MessageLog>,
    tools: ToolFunctions,
    notifier: Notifier,
    audio: broadcast::Sender<SessionAudio>,
    shutdown: CancellationToken,
    abort: CancellationToken,
    tracker: TaskTracker,
}

impl EventLoop {
    async fn run(mut self) {
        let end = loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => return,
                event = self.inbound.recv() => event,
            };
            match event {
                Some(InboundEvent::FunctionCall {
                    call_id,
                    name,
                    arguments,
                }) => self.dispatch(call_id, name, arguments),
                Some(InboundEvent::SpeechStarted) => {
                    tracing::debug!("user speech started");
                    self.play(SessionAudio::SpeechStarted);
                }
                Some(InboundEvent::AudioDelta(chunk)) => self.play(SessionAudio::Output(chunk)),
                Some(InboundEvent::UserTranscript(text)) => self.log.user_text(&text),
                Some(InboundEvent::AssistantMessage(text)) => self.log.assistant_text(&text),
                Some(InboundEvent::Usage(usage)) => {
                    if !self.log.record_usage(usage) {
                        tracing::debug!(?usage, "usage without a reply to attach to");
                    }
                }
                Some(InboundEvent::TokenTotals(totals)) => {
                    if let Some(inner) = self.inner.upgrade() {
                        *lock(&inner.totals) = totals;
                    }
                }
                Some(InboundEvent::ServerError(message)) => {
                    tracing::warn!("realtime service error: {}", message);
                    self.notifier
                        .publish(Notification::error("Voice assistant error", &message));
                }
                Some(InboundEvent::Ready) => tracing::debug!("session configuration acknowledged"),
                Some(InboundEvent::Closed { reason }) => {
                    tracing::info!(reason = reason.as_deref().unwrap_or(""), "realtime link closed");
                    break SessionStatus::Ended;
                }
                Some(InboundEvent::Fault(message)) => break SessionStatus::Error(message),
                None => break SessionStatus::Error("the realtime link closed unexpectedly".to_string()),
            }
        };
        if let Some(inner) = self.inner.upgrade() {
            inner.finish(self.generation, end);
        }
    }

    fn play(&self, audio: SessionAudio) {
        // Nobody listening means no playback is attached.
        let _ = self.audio.send(audio);
    }

    fn dispatch(&self, call_id: String, name: String, arguments: String) {
        tracing::info!(%call_id, tool = %name, "tool invocation");
        self.log.invocation(&call_id, &name, &arguments);

        let tools = self.tools.clone();
        let log = self.log.clone();
        let notifier = self.notifier.clone();
        let outbound = self.outbound.clone();
        let abort = self.abort.clone();
        self.tracker.spawn(async move {
            let result = tokio::select! {
                result = tools.invoke(&name, &arguments) => result,
                _ = abort.cancelled() => ToolResult::failure(format!("The session ended before {name} finished.")),
            };
            tracing::debug!(%call_id, tool = %name, success = result.success, "tool finished");
            log.invocation_result(&call_id, &name, &result);
            notifier.tool_result(&name, &result);

            let output = OutboundEvent::FunctionOutput {
                call_id: call_id.clone(),
                output: result.to_output(),
            };
            if outbound.send(output).await.is_err() || outbound.send(OutboundEvent::CreateResponse).await.is_err() {
                tracing::warn!(%call_id, "tool result not delivered, the realtime link is closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fake::{FakeTransport, Remote};
    use crate::backends::{ContentGenerator, MockScraper};
    use crate::bridge::PresentationBridge;
    use crate::error::BackendError;
    use crate::registry::CapabilityRegistry;
    use crate::shell::AppShell;
    use std::collections::HashMap;
    use std::time::Duration;

    struct SlowGenerator(Duration);

    #[async_trait::async_trait]
    impl ContentGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            tokio::time::sleep(self.0).await;
            Ok("slow content".to_string())
        }
    }

    fn manager(transport: Arc<FakeTransport>) -> (SessionManager, Notifier) {
        manager_with_generator(transport, Duration::from_secs(5))
    }

    fn manager_with_generator(transport: Arc<FakeTransport>, generation_time: Duration) -> (SessionManager, Notifier) {
        let shell = Arc::new(AppShell::default());
        let bridge = PresentationBridge::new(Arc::new(CapabilityRegistry::new()));
        let tools = ToolFunctions::new(
            shell,
            bridge,
            Arc::new(SlowGenerator(generation_time)),
            Arc::new(MockScraper::new()),
        );
        let notifier = Notifier::default();
        let manager = SessionManager::new(
            transport,
            tools,
            ToolCatalog::standard(),
            notifier.clone(),
            SessionConfig::default(),
        );
        (manager, notifier)
    }

    /// Reads `count` function outputs, checking each is followed by a
    /// response request.
    async fn outputs(remote: &mut Remote, count: usize) -> Vec<(String, ToolResult)> {
        let mut results = Vec::new();
        while results.len() < count {
            match remote.outbound.recv().await {
                Some(OutboundEvent::FunctionOutput { call_id, output }) => {
                    let result: ToolResult = serde_json::from_str(&output).unwrap();
                    results.push((call_id, result));
                    assert_eq!(remote.outbound.recv().await, Some(OutboundEvent::CreateResponse));
                }
                Some(other) => panic!("unexpected outbound event {other:?}"),
                None => panic!("link closed after {} outputs", results.len()),
            }
        }
        results
    }

    #[tokio::test(start_paused = true)]
    async fn start_negotiates_tools_and_voice() {
        // Arrange
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());

        // Act
        let status = manager.start(Voice::Coral).await;

        // Assert
        assert_eq!(status, SessionStatus::Active);
        let requests = lock(&transport.requests);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].voice, Voice::Coral);
        assert_eq!(requests[0].tools.len(), 19);
        assert_eq!(manager.voice(), Voice::Coral);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_active_does_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());

        manager.start(Voice::Ash).await;
        let status = manager.start(Voice::Sage).await;

        assert_eq!(status, SessionStatus::Active);
        assert_eq!(transport.attempts(), 1);
        assert_eq!(manager.voice(), Voice::Ash);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_twice_stays_ended_and_closes_link() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();

        assert_eq!(manager.stop().await, SessionStatus::Ended);
        assert_eq!(manager.stop().await, SessionStatus::Ended);
        assert_eq!(remote.outbound.recv().await, None);
        assert_eq!(manager.send_text("hello").await, Err(SessionError::NotActive));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_is_ended() {
        let (manager, _) = manager(Arc::new(FakeTransport::default()));
        assert_eq!(manager.status(), SessionStatus::Idle);
        assert_eq!(manager.stop().await, SessionStatus::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn every_invocation_gets_one_result() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, notifier) = manager(transport.clone());
        let mut notifications = notifier.subscribe();
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();

        remote.call("call_1", "getCurrentTime", "{}").await;
        remote.call("call_2", "takeScreenshot", "{}").await;
        remote.call("call_3", "goToSlideNumber", "{not json").await;

        let results: HashMap<_, _> = outputs(&mut remote, 3).await.into_iter().collect();
        assert!(results["call_1"].success);
        assert!(!results["call_2"].success);
        assert!(!results["call_3"].success);

        let log = manager.log();
        assert_eq!(log.invocation_count(), 3);
        assert_eq!(log.result_count(), 3);
        assert_eq!(manager.status(), SessionStatus::Active);

        let mut tool_notifications = 0;
        while let Ok(n) = notifications.try_recv() {
            if n.title.starts_with("getCurrentTime")
                || n.title.starts_with("takeScreenshot")
                || n.title.starts_with("goToSlideNumber")
            {
                tool_notifications += 1;
            }
        }
        assert_eq!(tool_notifications, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_does_not_hold_up_the_next_call() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();

        remote.call("slow", "generateContent", r#"{"prompt":"a startup"}"#).await;
        remote.call("fast", "getCurrentTime", "").await;

        let results = outputs(&mut remote, 2).await;
        assert_eq!(results[0].0, "fast");
        assert_eq!(results[1].0, "slow");
        assert_eq!(results[1].1.field("content"), Some(&serde_json::json!("slow content")));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_calls_that_outlive_the_flush() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager_with_generator(transport.clone(), Duration::from_secs(20));
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();

        remote.call("call_1", "generateContent", r#"{"prompt":"x"}"#).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.log().invocation_count(), 1);

        manager.stop().await;

        let results = outputs(&mut remote, 1).await;
        assert_eq!(results[0].0, "call_1");
        assert!(!results[0].1.success);
        assert!(results[0].1.message.contains("session ended"));
        assert_eq!(remote.outbound.recv().await, None);
        assert_eq!(manager.log().result_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failures_cap_out_in_error() {
        let transport = Arc::new(FakeTransport::refusing(usize::MAX));
        let (manager, notifier) = manager(transport.clone());
        let mut notifications = notifier.subscribe();

        let status = manager.start(Voice::Ash).await;

        assert!(matches!(status, SessionStatus::Error(ref reason) if reason.contains("connection refused")));
        assert_eq!(transport.attempts(), 3);
        assert_eq!(notifications.try_recv().unwrap().title, "Voice session failed");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let transport = Arc::new(FakeTransport::refusing(1));
        let (manager, _) = manager(transport.clone());

        assert_eq!(manager.start(Voice::Ash).await, SessionStatus::Active);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_ready_signal_times_out() {
        let transport = Arc::new(FakeTransport::never_ready());
        let (manager, _) = manager(transport.clone());

        let status = manager.start(Voice::Ash).await;

        assert!(matches!(status, SessionStatus::Error(ref reason) if reason.contains("ready")));
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn link_fault_moves_to_error_until_restarted() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        let mut status = manager.subscribe_status();
        manager.start(Voice::Ash).await;
        let remote = transport.remote();

        remote.inbound.send(InboundEvent::Fault("socket reset".into())).await.unwrap();
        status
            .wait_for(|s| matches!(s, SessionStatus::Error(_)))
            .await
            .unwrap();
        assert_eq!(manager.status(), SessionStatus::Error("socket reset".into()));
        assert_eq!(manager.send_text("anyone?").await, Err(SessionError::NotActive));

        assert_eq!(manager.start(Voice::Ash).await, SessionStatus::Active);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fault_right_after_ready_is_never_reported_active() {
        for _ in 0..200 {
            let transport = Arc::new(FakeTransport::faulting_after_ready("dropped"));
            let (manager, _) = manager(transport);
            let mut status = manager.subscribe_status();

            manager.start(Voice::Ash).await;

            tokio::time::timeout(
                Duration::from_secs(5),
                status.wait_for(|s| matches!(s, SessionStatus::Error(_))),
            )
            .await
            .expect("the fault never reached the status")
            .unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
            assert_eq!(manager.status(), SessionStatus::Error("dropped".into()));
            assert_eq!(manager.send_text("hello").await, Err(SessionError::NotActive));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn audio_keeps_flowing_while_a_tool_call_is_pending() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        let mut audio = manager.subscribe_audio();
        assert_eq!(manager.send_audio("AAAA".into()), Err(SessionError::NotActive));
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();
        let started = tokio::time::Instant::now();

        remote.call("slow", "generateContent", r#"{"prompt":"a startup"}"#).await;
        manager.send_audio("AAAA".into()).unwrap();
        manager.send_audio("BBBB".into()).unwrap();
        remote.inbound.send(InboundEvent::SpeechStarted).await.unwrap();
        remote.inbound.send(InboundEvent::AudioDelta("CCCC".into())).await.unwrap();

        assert_eq!(remote.outbound.recv().await, Some(OutboundEvent::Audio("AAAA".into())));
        assert_eq!(remote.outbound.recv().await, Some(OutboundEvent::Audio("BBBB".into())));
        assert_eq!(audio.recv().await.unwrap(), SessionAudio::SpeechStarted);
        assert_eq!(audio.recv().await.unwrap(), SessionAudio::Output("CCCC".into()));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(manager.log().result_count(), 0);

        let (call_id, result) = remote.next_output().await;
        assert_eq!(call_id, "slow");
        assert!(result.success);
    }

    #[tokio::test(start_paused = true)]
    async fn token_totals_follow_the_transport_and_reset_per_session() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        let mut status = manager.subscribe_status();
        manager.start(Voice::Ash).await;
        let remote = transport.remote();

        remote
            .inbound
            .send(InboundEvent::TokenTotals(TokenUsage::new(20, 10, 30)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.token_totals(), TokenUsage::new(20, 10, 30));

        remote.inbound.send(InboundEvent::Closed { reason: None }).await.unwrap();
        status.wait_for(|s| *s == SessionStatus::Ended).await.unwrap();
        assert_eq!(manager.token_totals(), TokenUsage::new(20, 10, 30));

        manager.start(Voice::Ash).await;
        assert_eq!(manager.token_totals(), TokenUsage::default());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_close_ends_the_session() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        let mut status = manager.subscribe_status();
        manager.start(Voice::Ash).await;
        let remote = transport.remote();

        remote
            .inbound
            .send(InboundEvent::Closed {
                reason: Some("bye".into()),
            })
            .await
            .unwrap();
        status.wait_for(|s| *s == SessionStatus::Ended).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_running_session() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        manager.start(Voice::Ash).await;
        let mut first = transport.remote();

        assert_eq!(manager.restart(Voice::Verse).await, SessionStatus::Active);

        assert_eq!(first.outbound.recv().await, None);
        assert_eq!(transport.attempts(), 2);
        assert_eq!(manager.voice(), Voice::Verse);
    }

    #[tokio::test(start_paused = true)]
    async fn text_and_transcripts_are_logged_in_order() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        assert_eq!(manager.send_text("too early").await, Err(SessionError::NotActive));
        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();

        manager.send_text("Intro. Hello").await.unwrap();
        assert_eq!(
            remote.outbound.recv().await,
            Some(OutboundEvent::UserText("Intro. Hello".into()))
        );
        assert_eq!(remote.outbound.recv().await, Some(OutboundEvent::CreateResponse));

        remote
            .inbound
            .send(InboundEvent::AssistantMessage("Welcome!".into()))
            .await
            .unwrap();
        remote
            .inbound
            .send(InboundEvent::Usage(TokenUsage::new(5, 7, 12)))
            .await
            .unwrap();
        remote
            .inbound
            .send(InboundEvent::UserTranscript("next slide".into()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let entries = manager.log().entries();
        let texts: Vec<_> = entries.iter().filter_map(LogEntry::text).collect();
        assert_eq!(texts, vec!["Intro. Hello", "Welcome!", "next slide"]);
        assert_eq!(entries[1].usage, Some(TokenUsage::new(5, 7, 12)));
    }

    #[tokio::test(start_paused = true)]
    async fn narration_sink_follows_session_state() {
        let transport = Arc::new(FakeTransport::default());
        let (manager, _) = manager(transport.clone());
        let sink: &dyn NarrationSink = &manager;
        assert!(!sink.is_active());
        assert_eq!(sink.send_narration("x"), Err(SessionError::NotActive));

        manager.start(Voice::Ash).await;
        let mut remote = transport.remote();
        assert!(sink.is_active());
        sink.send_narration("Slide 1. Hello").unwrap();
        assert_eq!(
            remote.outbound.recv().await,
            Some(OutboundEvent::UserText("Slide 1. Hello".into()))
        );
    }
}
