use crate::types;
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use openai_realtime_types::audio::Base64EncodedAudioBytes;
use openai_realtime_types::session::Session;
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;

mod config;
mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

// Channel capacity, the outbound sender and a template receiver for the
// broadcast once connected, and usage stats shared with the receive task.
// Only the receive task holds the broadcast sender.
pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<ClientTx>,
    s_rx: Option<ServerRx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_rx: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<types::ClientEvent>(self.capacity);
        let (s_tx, s_rx) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx);
        self.s_rx = Some(s_rx);

        // Serialises outbound events until every sender is gone, then says goodbye.
        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
            if let Err(e) = write.send(Message::Close(None)).await {
                tracing::debug!("close frame not delivered: {}", e);
            }
            let _ = write.close().await;
            tracing::debug!("outbound task finished");
        });

        let stats = self.stats.clone();
        // Decodes inbound frames and broadcasts them. Dropping `s_tx` at the end
        // is what tells subscribers the connection is gone.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                            let event_type = json.get("type").and_then(|v| v.as_str());
                            let event_id = json.get("event_id").and_then(|v| v.as_str());
                            tracing::debug!(
                                "received message: {}, id={}",
                                event_type.unwrap_or("unknown"),
                                event_id.unwrap_or("unknown")
                            );
                        }
                        match serde_json::from_str::<types::ServerEvent>(&text) {
                            Ok(types::ServerEvent::Other) => {}
                            Ok(event) => {
                                if let types::ServerEvent::ResponseDone(response) = &event {
                                    if let Some(usage) = response.response().usage() {
                                        match stats.lock() {
                                            Ok(mut stats_guard) => stats_guard.update_usage(
                                                usage.total_tokens(),
                                                usage.input_tokens(),
                                                usage.output_tokens(),
                                            ),
                                            Err(_) => tracing::error!("failed to update stats"),
                                        }
                                        tracing::debug!(
                                            total_tokens = usage.total_tokens(),
                                            input_tokens = usage.input_tokens(),
                                            output_tokens = usage.output_tokens(),
                                            "response usage"
                                        );
                                    }
                                }
                                if let Err(e) = s_tx.send(event) {
                                    tracing::debug!("no subscribers for event: {}", e);
                                }
                            }
                            Err(e) => {
                                tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                            }
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close_event = types::ServerEvent::Close {
                            reason: reason.map(|frame| frame.reason.to_string()),
                        };
                        if let Err(e) = s_tx.send(close_event) {
                            tracing::error!("failed to send close event: {}", e);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            drop(s_tx);
        });
        Ok(())
    }

    // Subscribe to server events. Each call gets its own receiver.
    pub fn server_events(&self) -> Result<ServerRx> {
        match self.s_rx {
            Some(ref rx) => Ok(rx.resubscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    /// Send a client event.
    pub async fn send_client_event(&self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    pub async fn update_session(&self, config: Session) -> Result<()> {
        let event = types::ClientEvent::SessionUpdate(types::events::client::SessionUpdateEvent::new(config));
        self.send_client_event(event).await
    }

    pub async fn append_input_audio_buffer(&self, audio: Base64EncodedAudioBytes) -> Result<()> {
        let event = types::ClientEvent::InputAudioBufferAppend(
            types::events::client::InputAudioBufferAppendEvent::new(audio),
        );
        self.send_client_event(event).await
    }

    pub async fn create_conversation_item(&self, item: types::Item) -> Result<()> {
        let event = types::ClientEvent::ConversationItemCreate(
            types::events::client::ConversationItemCreateEvent::new(item),
        );
        self.send_client_event(event).await
    }

    pub async fn create_response(&self) -> Result<()> {
        let event = types::ClientEvent::ResponseCreate(types::events::client::ResponseCreateEvent::new());
        self.send_client_event(event).await
    }

    /// Stops accepting events. Anything already queued is still written,
    /// then a close frame is sent. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.c_tx.take().is_some() {
            tracing::debug!("closing realtime client");
        }
        self.s_rx = None;
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

// Create a client with the given config and connect it.
pub async fn connect_with_config(capacity: usize, config: Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}
