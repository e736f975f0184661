//! The application-wide session context.
//!
//! One [`SessionContext`] lives as long as the application shell. It owns the
//! single session manager and the capability registry, so moving between
//! pages (and mounting or unmounting presentations) never touches the voice
//! session.

use crate::backends::{ContentGenerator, FirecrawlScraper, HttpContentGenerator, Scraper};
use crate::bridge::PresentationBridge;
use crate::config::{CoreConfig, NarrationConfig};
use crate::error::{BackendError, SessionError};
use crate::navigation;
use crate::notify::Notifier;
use crate::presentation::{self, MountedPresentation, NarrationSink, Presentation, PresentationViewer, ViewerSnapshot};
use crate::registry::CapabilityRegistry;
use crate::session::{MessageLog, RealtimeTransport, SessionManager, SessionStatus};
use crate::shell::AppShell;
use crate::tools::{ToolCatalog, ToolFunctions, ToolResult};
use openai_realtime_types::audio::Voice;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SessionContext {
    registry: Arc<CapabilityRegistry>,
    bridge: PresentationBridge,
    shell: Arc<AppShell>,
    notifier: Notifier,
    tools: ToolFunctions,
    session: SessionManager,
    narration: NarrationConfig,
    mounted: Mutex<Option<MountedPresentation>>,
}

impl SessionContext {
    pub fn new(
        config: CoreConfig,
        catalog: ToolCatalog,
        transport: Arc<dyn RealtimeTransport>,
        generator: Arc<dyn ContentGenerator>,
        scraper: Arc<dyn Scraper>,
    ) -> Self {
        let registry = Arc::new(CapabilityRegistry::new());
        let bridge = PresentationBridge::new(registry.clone());
        let shell = Arc::new(AppShell::default());
        let notifier = Notifier::default();
        let tools = ToolFunctions::new(shell.clone(), bridge.clone(), generator, scraper)
            .with_timeout(config.backend.tool_timeout)
            .with_max_scrape_chars(config.backend.max_scrape_chars);
        tracing::info!(tools = catalog.len(), "tool catalog ready");
        let session = SessionManager::new(transport, tools.clone(), catalog, notifier.clone(), config.session);

        Self {
            registry,
            bridge,
            shell,
            notifier,
            tools,
            session,
            narration: config.narration,
            mounted: Mutex::new(None),
        }
    }

    /// Builds the HTTP backends from `config.backend`.
    pub fn with_http_backends(
        config: CoreConfig,
        catalog: ToolCatalog,
        transport: Arc<dyn RealtimeTransport>,
    ) -> Result<Self, BackendError> {
        let backend = &config.backend;
        let generator = HttpContentGenerator::new(&backend.generation_url, backend.tool_timeout)?;
        let scraper = FirecrawlScraper::new(
            &backend.firecrawl_base_url,
            backend.firecrawl_api_key.clone(),
            backend.tool_timeout,
        )?;
        Ok(Self::new(config, catalog, transport, Arc::new(generator), Arc::new(scraper)))
    }

    pub fn shell(&self) -> &Arc<AppShell> {
        &self.shell
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn bridge(&self) -> &PresentationBridge {
        &self.bridge
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn log(&self) -> Arc<MessageLog> {
        self.session.log()
    }

    pub async fn start(&self) -> SessionStatus {
        self.session.start(self.session.voice()).await
    }

    pub async fn stop(&self) -> SessionStatus {
        self.session.stop().await
    }

    pub async fn restart(&self) -> SessionStatus {
        self.session.restart(self.session.voice()).await
    }

    /// Starts a session when none is running, otherwise stops it.
    pub async fn toggle(&self) -> SessionStatus {
        if self.session.status().is_live() {
            self.stop().await
        } else {
            self.start().await
        }
    }

    /// Picks the voice for the next session.
    pub fn set_voice(&self, voice: Voice) {
        tracing::info!(%voice, "voice selected");
        self.session.set_voice(voice);
    }

    pub async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        self.session.send_text(text).await
    }

    /// Runs a tool by hand, outside the conversation.
    pub async fn run_tool(&self, name: &str, arguments: &str) -> ToolResult {
        let result = self.tools.invoke(name, arguments).await;
        self.notifier.tool_result(name, &result);
        result
    }

    fn mounted(&self) -> MutexGuard<'_, Option<MountedPresentation>> {
        self.mounted.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Shows `deck`. A deck with another id replaces the one on screen and
    /// starts at its first slide.
    pub fn mount_deck(&self, deck: Presentation) -> ViewerSnapshot {
        let mut mounted = self.mounted();
        if let Some(current) = mounted.as_ref() {
            current.load(deck);
            return current.viewer().snapshot();
        }
        let sink: Arc<dyn NarrationSink> = Arc::new(self.session.clone());
        let viewer = PresentationViewer::new(deck, sink, self.shell.clone(), self.narration.clone());
        let presentation = MountedPresentation::mount(&self.bridge, viewer);
        let snapshot = presentation.viewer().snapshot();
        *mounted = Some(presentation);
        snapshot
    }

    /// Mounts a built-in deck by id.
    pub fn mount_presentation(&self, id: &str) -> Option<ViewerSnapshot> {
        match presentation::builtin(id) {
            Some(deck) => Some(self.mount_deck(deck)),
            None => {
                tracing::warn!(id, "no such presentation");
                None
            }
        }
    }

    pub fn unmount_presentation(&self) -> bool {
        let unmounted = self.mounted().take();
        unmounted.is_some()
    }

    pub fn presentation(&self) -> Option<ViewerSnapshot> {
        self.mounted().as_ref().map(|m| m.viewer().snapshot())
    }

    /// Mounts or unmounts the viewer to match `route`. Front ends call this
    /// for every `Navigate` effect.
    pub fn sync_route(&self, route: &str) -> Option<ViewerSnapshot> {
        match navigation::presentation_id(route) {
            Some(id) => self.mount_presentation(id),
            None => {
                self.unmount_presentation();
                None
            }
        }
    }
}
