pub mod client;
pub mod server;

use client::*;
use server::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate(SessionUpdateEvent),
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend(InputAudioBufferAppendEvent),
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit(InputAudioBufferCommitEvent),
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear(InputAudioBufferClearEvent),
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate(ConversationItemCreateEvent),
    #[serde(rename = "response.create")]
    ResponseCreate(ResponseCreateEvent),
    #[serde(rename = "response.cancel")]
    ResponseCancel(ResponseCancelEvent),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Synthesised by the client when the socket sends a close frame.
    #[serde(rename = "close")]
    Close { reason: Option<String> },
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "session.created")]
    SessionCreated(SessionCreatedEvent),
    #[serde(rename = "session.updated")]
    SessionUpdated(SessionUpdatedEvent),
    #[serde(rename = "input_audio_buffer.speech_started")]
    InputAudioBufferSpeechStarted(InputAudioBufferSpeechStartedEvent),
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    InputAudioBufferSpeechStopped(InputAudioBufferSpeechStoppedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    ConversationItemInputAudioTranscriptionCompleted(ConversationItemInputAudioTranscriptionCompletedEvent),
    #[serde(rename = "response.created")]
    ResponseCreated(ResponseCreatedEvent),
    #[serde(rename = "response.done")]
    ResponseDone(ResponseDoneEvent),
    #[serde(rename = "response.output_item.done")]
    ResponseOutputItemDone(ResponseOutputItemDoneEvent),
    #[serde(rename = "response.text.done")]
    ResponseTextDone(ResponseTextDoneEvent),
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta(ResponseAudioDeltaEvent),
    #[serde(rename = "response.audio_transcript.done")]
    ResponseAudioTranscriptDone(ResponseAudioTranscriptDoneEvent),
    #[serde(rename = "response.function_call_arguments.done")]
    ResponseFunctionCallArgumentsDone(ResponseFunctionCallArgumentsDoneEvent),
    /// Any event type this crate does not model (rate limits, text deltas, ...).
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FunctionCallOutputItem, Item};

    #[test]
    fn client_event_is_tagged_with_wire_name() {
        let event = ClientEvent::ConversationItemCreate(ConversationItemCreateEvent::new(
            Item::FunctionCallOutput(FunctionCallOutputItem::new("call_1", "done")),
        ));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "conversation.item.create");
        assert_eq!(value["item"]["call_id"], "call_1");

        let value = serde_json::to_value(ClientEvent::ResponseCreate(ResponseCreateEvent::new())).unwrap();
        assert_eq!(value, serde_json::json!({"type": "response.create"}));
    }

    #[test]
    fn unknown_server_events_decode_as_other() {
        let json = r#"{"type":"rate_limits.updated","event_id":"e1","rate_limits":[]}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ServerEvent::Other));
    }

    #[test]
    fn audio_delta_carries_the_chunk() {
        let json = r#"{"type":"response.audio.delta","event_id":"e1","response_id":"r","item_id":"i","output_index":0,"content_index":0,"delta":"AAAA"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::ResponseAudioDelta(delta) = event else {
            panic!("expected response.audio.delta");
        };
        assert_eq!(delta.delta(), "AAAA");
        assert_eq!(delta.item_id(), "i");
    }

    #[test]
    fn output_item_done_with_function_call() {
        let json = r#"{
            "type":"response.output_item.done",
            "event_id":"e2",
            "response_id":"resp_1",
            "output_index":0,
            "item":{"id":"item_9","object":"realtime.item","type":"function_call","status":"completed",
                    "call_id":"call_9","name":"goToSlideNumber","arguments":"{\"slideNumber\":3}"}
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::ResponseOutputItemDone(done) = event else {
            panic!("expected output_item.done");
        };
        let Some(Item::FunctionCall(call)) = done.item().as_item() else {
            panic!("expected a function call item");
        };
        assert_eq!(call.call_id(), "call_9");
        assert_eq!(call.name(), "goToSlideNumber");
    }

    #[test]
    fn response_done_usage() {
        let json = r#"{
            "type":"response.done",
            "event_id":"e3",
            "response":{"id":"resp_1","object":"realtime.response","status":"completed","output":[],
                        "usage":{"total_tokens":30,"input_tokens":20,"output_tokens":10}}
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::ResponseDone(done) = event else {
            panic!("expected response.done");
        };
        let usage = done.response().usage().unwrap();
        assert_eq!(usage.total_tokens(), 30);
        assert_eq!(usage.input_tokens(), 20);
        assert_eq!(usage.output_tokens(), 10);
    }

    #[test]
    fn error_event_details() {
        let json = r#"{"type":"error","event_id":"e4","error":{"type":"invalid_request_error","code":"bad","message":"Nope","param":null,"event_id":null}}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::Error(error) = event else {
            panic!("expected error");
        };
        assert_eq!(error.error().message(), "Nope");
        assert_eq!(error.error().code(), Some("bad"));
    }
}
