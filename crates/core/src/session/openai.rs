use crate::session::log::TokenUsage;
use crate::session::transport::{ConnectRequest, InboundEvent, OutboundEvent, RealtimeTransport, TransportLink};
use anyhow::Context;
use async_trait::async_trait;
use openai_realtime::types::audio::{ServerVadTurnDetection, TranscriptionModel, TurnDetection};
use openai_realtime::types::tools::ToolChoice;
use openai_realtime::types::{FunctionCallOutputItem, Item, MessageItem, MessageRole, ServerEvent, Session};
use openai_realtime::{Client, Config, ServerRx};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

/// [`RealtimeTransport`] over the OpenAI realtime websocket.
pub struct OpenAiTransport {
    config: Config,
    capacity: usize,
}

impl OpenAiTransport {
    pub fn new(config: Config) -> Self {
        Self { config, capacity: 1024 }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[async_trait]
impl RealtimeTransport for OpenAiTransport {
    async fn connect(&self, request: ConnectRequest) -> anyhow::Result<TransportLink> {
        let client = openai_realtime::connect_with_config(self.capacity, self.config.clone())
            .await
            .context("failed to connect to the realtime API")?;
        let server_events = client.server_events()?;

        let turn_detection = TurnDetection::ServerVad(
            ServerVadTurnDetection::default()
                .with_create_response(true)
                .with_interrupt_response(true),
        );
        let session = Session::builder()
            .with_modalities_enable_audio()
            .with_instructions(&request.instructions)
            .with_voice(request.voice)
            .with_input_audio_transcription_enable(TranscriptionModel::Whisper)
            .with_turn_detection_enable(turn_detection)
            .with_tools(request.tools)
            .with_tool_choice(ToolChoice::Auto)
            .build();
        client
            .update_session(session)
            .await
            .context("failed to send the session configuration")?;

        let (outbound_tx, outbound_rx) = mpsc::channel(self.capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(self.capacity);
        tokio::spawn(pump(client, outbound_rx, server_events, inbound_tx));

        Ok(TransportLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Moves events both ways until the session lets go of the link or the
/// connection ends, then closes the client.
async fn pump(
    mut client: Client,
    mut outbound: mpsc::Receiver<OutboundEvent>,
    mut server_events: ServerRx,
    inbound: mpsc::Sender<InboundEvent>,
) {
    loop {
        tokio::select! {
            event = outbound.recv() => match event {
                Some(event) => {
                    if let Err(e) = forward(&client, event).await {
                        tracing::error!("failed to send to the realtime API: {:#}", e);
                        let _ = inbound.send(InboundEvent::Fault(format!("send failed: {e}"))).await;
                        break;
                    }
                }
                None => {
                    tracing::debug!("session released the realtime link");
                    break;
                }
            },
            event = server_events.recv() => match event {
                Ok(event) => {
                    let response_done = matches!(event, ServerEvent::ResponseDone(_));
                    if let Some(event) = inbound_event(event) {
                        if inbound.send(event).await.is_err() {
                            break;
                        }
                    }
                    // The client has already folded this response into its stats.
                    if response_done {
                        if let Some(totals) = token_totals(&client) {
                            if inbound.send(InboundEvent::TokenTotals(totals)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "realtime events were dropped");
                }
                Err(RecvError::Closed) => {
                    let _ = inbound
                        .send(InboundEvent::Fault("the realtime connection was lost".to_string()))
                        .await;
                    break;
                }
            },
        }
    }
    if let Some(totals) = token_totals(&client) {
        tracing::info!(
            input_tokens = totals.input_tokens,
            output_tokens = totals.output_tokens,
            total_tokens = totals.total_tokens,
            "realtime link closed"
        );
    }
    client.close();
}

async fn forward(client: &Client, event: OutboundEvent) -> anyhow::Result<()> {
    match event {
        OutboundEvent::Audio(audio) => client.append_input_audio_buffer(audio).await,
        OutboundEvent::UserText(text) => client.create_conversation_item(user_message(&text)).await,
        OutboundEvent::FunctionOutput { call_id, output } => {
            client.create_conversation_item(function_output(&call_id, &output)).await
        }
        OutboundEvent::CreateResponse => client.create_response().await,
    }
}

fn user_message(text: &str) -> Item {
    let item = MessageItem::builder()
        .with_role(MessageRole::User)
        .with_input_text(text)
        .build();
    Item::Message(item)
}

fn function_output(call_id: &str, output: &str) -> Item {
    Item::FunctionCallOutput(FunctionCallOutputItem::new(call_id, output))
}

fn tokens(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}

fn token_totals(client: &Client) -> Option<TokenUsage> {
    match client.stats() {
        Ok(stats) => Some(TokenUsage::new(
            tokens(stats.input_tokens()),
            tokens(stats.output_tokens()),
            tokens(stats.total_tokens()),
        )),
        Err(e) => {
            tracing::warn!("token totals unavailable: {:#}", e);
            None
        }
    }
}

/// The part of the server's event stream the session cares about.
fn inbound_event(event: ServerEvent) -> Option<InboundEvent> {
    match event {
        ServerEvent::SessionUpdated(_) => Some(InboundEvent::Ready),
        ServerEvent::InputAudioBufferSpeechStarted(_) => Some(InboundEvent::SpeechStarted),
        ServerEvent::ResponseAudioDelta(delta) => Some(InboundEvent::AudioDelta(delta.delta().clone())),
        ServerEvent::ResponseOutputItemDone(done) => match done.item().as_item() {
            Some(Item::FunctionCall(call)) => Some(InboundEvent::FunctionCall {
                call_id: call.call_id().to_string(),
                name: call.name().to_string(),
                arguments: call.arguments().to_string(),
            }),
            _ => None,
        },
        ServerEvent::ConversationItemInputAudioTranscriptionCompleted(done) => {
            Some(InboundEvent::UserTranscript(done.transcript().trim().to_string()))
        }
        ServerEvent::ResponseAudioTranscriptDone(done) => Some(InboundEvent::AssistantMessage(done.transcript().to_string())),
        ServerEvent::ResponseTextDone(done) => Some(InboundEvent::AssistantMessage(done.text().to_string())),
        ServerEvent::ResponseDone(done) => done.response().usage().map(|usage| {
            InboundEvent::Usage(TokenUsage::new(
                tokens(usage.input_tokens()),
                tokens(usage.output_tokens()),
                tokens(usage.total_tokens()),
            ))
        }),
        ServerEvent::Error(e) => Some(InboundEvent::ServerError(e.error().to_string())),
        ServerEvent::Close { reason } => Some(InboundEvent::Closed { reason }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Option<InboundEvent> {
        inbound_event(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn session_updated_means_ready() {
        let json = r#"{"type":"session.updated","event_id":"e1","session":{"id":"sess_1"}}"#;
        assert_eq!(decode(json), Some(InboundEvent::Ready));
    }

    #[test]
    fn function_call_item_becomes_invocation() {
        let json = r#"{
            "type":"response.output_item.done",
            "event_id":"e2",
            "response_id":"resp_1",
            "output_index":0,
            "item":{"id":"item_9","object":"realtime.item","type":"function_call","status":"completed",
                    "call_id":"call_9","name":"goToSlideNumber","arguments":"{\"slideNumber\":3}"}
        }"#;
        assert_eq!(
            decode(json),
            Some(InboundEvent::FunctionCall {
                call_id: "call_9".into(),
                name: "goToSlideNumber".into(),
                arguments: r#"{"slideNumber":3}"#.into(),
            })
        );
    }

    #[test]
    fn message_item_is_not_an_invocation() {
        let json = r#"{
            "type":"response.output_item.done",
            "event_id":"e3",
            "response_id":"resp_1",
            "output_index":0,
            "item":{"id":"item_1","object":"realtime.item","type":"message","status":"completed","role":"assistant",
                    "content":[{"type":"audio","transcript":"Hello"}]}
        }"#;
        assert_eq!(decode(json), None);
    }

    #[test]
    fn usage_and_errors() {
        let done = r#"{
            "type":"response.done",
            "event_id":"e4",
            "response":{"id":"resp_1","object":"realtime.response","status":"completed","output":[],
                        "usage":{"total_tokens":30,"input_tokens":20,"output_tokens":10}}
        }"#;
        assert_eq!(decode(done), Some(InboundEvent::Usage(TokenUsage::new(20, 10, 30))));

        let error = r#"{"type":"error","event_id":"e5","error":{"type":"invalid_request_error","code":"bad","message":"Nope"}}"#;
        let Some(InboundEvent::ServerError(message)) = decode(error) else {
            panic!("expected a server error");
        };
        assert!(message.contains("Nope"));
    }

    #[test]
    fn transcripts_and_close() {
        let heard = r#"{"type":"conversation.item.input_audio_transcription.completed","event_id":"e6","item_id":"i","content_index":0,"transcript":" next slide \n"}"#;
        assert_eq!(decode(heard), Some(InboundEvent::UserTranscript("next slide".into())));

        let said = r#"{"type":"response.audio_transcript.done","event_id":"e7","response_id":"r","item_id":"i","output_index":0,"content_index":0,"transcript":"Moving on."}"#;
        assert_eq!(decode(said), Some(InboundEvent::AssistantMessage("Moving on.".into())));

        let close = ServerEvent::Close {
            reason: Some("server shutdown".into()),
        };
        assert_eq!(
            inbound_event(close),
            Some(InboundEvent::Closed {
                reason: Some("server shutdown".into())
            })
        );
    }

    #[test]
    fn audio_and_speech_events() {
        let delta = r#"{"type":"response.audio.delta","event_id":"e8","response_id":"r","item_id":"i","output_index":0,"content_index":0,"delta":"UklGRg=="}"#;
        assert_eq!(decode(delta), Some(InboundEvent::AudioDelta("UklGRg==".into())));

        let started = r#"{"type":"input_audio_buffer.speech_started","event_id":"e9","audio_start_ms":1200,"item_id":"i"}"#;
        assert_eq!(decode(started), Some(InboundEvent::SpeechStarted));
    }

    #[test]
    fn outbound_items_match_the_wire_shape() {
        let value = serde_json::to_value(function_output("call_1", r#"{"success":true,"message":"ok"}"#)).unwrap();
        assert_eq!(value["type"], "function_call_output");
        assert_eq!(value["call_id"], "call_1");

        let value = serde_json::to_value(user_message("Intro. Hello")).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"][0]["type"], "input_text");
        assert_eq!(value["content"][0]["text"], "Intro. Hello");
    }
}
