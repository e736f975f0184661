use crate::audio::Base64EncodedAudioBytes;
use crate::content::items::{ItemHeader, ItemStatus};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageItem {
    #[serde(flatten)]
    header: ItemHeader,

    /// The role of the message sender: "user", "assistant", "system"
    role: MessageRole,

    /// The content of the message
    #[serde(default)]
    content: Vec<Content>,
}

impl MessageItem {
    pub fn builder() -> MessageItemBuilder {
        MessageItemBuilder::new()
    }

    pub fn id(&self) -> Option<&str> {
        self.header.id.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.header.status.as_ref().map(ItemStatus::as_str)
    }

    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// Text of every text-bearing part, joined in order. Audio parts
    /// contribute their transcript.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::text)
            .collect::<Vec<_>>()
            .join("")
    }
}

pub struct MessageItemBuilder {
    item: MessageItem,
}

impl Default for MessageItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageItemBuilder {
    pub fn new() -> Self {
        Self {
            item: MessageItem {
                header: ItemHeader::default(),
                role: MessageRole::User,
                content: Vec::new(),
            },
        }
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        self.item.role = role;
        self
    }

    pub fn with_input_text(mut self, text: &str) -> Self {
        self.item.content.push(Content::input_text(text));
        self
    }

    pub fn with_input_audio(mut self, audio: Base64EncodedAudioBytes) -> Self {
        self.item.content.push(Content::InputAudio(InputAudioContent { audio: Some(audio), transcript: None }));
        self
    }

    pub fn build(self) -> MessageItem {
        self.item
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "input_text")]
    InputText(TextContent),
    #[serde(rename = "input_audio")]
    InputAudio(InputAudioContent),
    #[serde(rename = "text")]
    Text(TextContent),
    #[serde(rename = "audio")]
    Audio(AudioContent),
}

impl Content {
    pub fn input_text(text: &str) -> Self {
        Content::InputText(TextContent::new(text))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Content::InputText(c) | Content::Text(c) => Some(c.text()),
            Content::InputAudio(c) => c.transcript.as_deref(),
            Content::Audio(c) => c.transcript.as_deref(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TextContent {
    text: String,
}

impl TextContent {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_string() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct InputAudioContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<Base64EncodedAudioBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct AudioContent {
    #[serde(default)]
    transcript: Option<String>,
}

impl AudioContent {
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Item;

    #[test]
    fn user_text_message_shape() {
        let item = Item::Message(MessageItem::builder().with_input_text("Narrate slide 2").build());
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"][0]["type"], "input_text");
        assert_eq!(value["content"][0]["text"], "Narrate slide 2");
    }

    #[test]
    fn assistant_audio_text_uses_transcript() {
        let json = r#"{"id":"m1","type":"message","role":"assistant","content":[{"type":"audio","transcript":"Hello there"}]}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        let Item::Message(message) = item else {
            panic!("expected a message");
        };
        assert_eq!(message.role(), &MessageRole::Assistant);
        assert_eq!(message.text(), "Hello there");
    }
}
