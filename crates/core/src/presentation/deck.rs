use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slide {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Slide {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            background: None,
        }
    }

    pub fn with_background(mut self, background: &str) -> Self {
        self.background = Some(background.to_string());
        self
    }

    /// What gets read aloud for this slide.
    pub fn narration_text(&self) -> String {
        format!("{}. {}", self.title, self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub id: String,
    pub title: String,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(id: &str, title: &str, slides: Vec<Slide>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            slides,
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slide at a 0-based index.
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

const UNICORN: &[(&str, &str, &str)] = &[
    (
        "Unicorn Startup Creator & Presenter",
        "The AI agent that creates and pitches the next generation of billion-dollar startups, driven entirely by voice through a realtime speech model.",
        "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
    ),
    (
        "The Problem We Solve",
        "Creating successful startups is hard. Founders misread timing and market dynamics, struggle to pitch with clarity, and lack access to strategic and creative talent, which wastes time, capital and energy.",
        "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)",
    ),
    (
        "Our Revolutionary Solution",
        "Unicorn Startup Creator combines real-time data, autonomous agents and hosted logic endpoints to surface startup opportunities, validate them against market signals and produce investor-grade pitch material.",
        "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)",
    ),
    (
        "Meet the Builders",
        "The system was designed by full-stack developers with experience in AI integration, real-time systems and product development.",
        "linear-gradient(135deg, #43e97b 0%, #38f9d7 100%)",
    ),
    (
        "ChainOpera AI - The Key Enabler",
        "ChainOpera AI is the execution layer for high-context generation: business model synthesis, founder narratives, investor storytelling and multi-modal components through dynamically registered endpoints.",
        "linear-gradient(135deg, #fa709a 0%, #fee140 100%)",
    ),
    (
        "Real-Time Voice Interaction",
        "A realtime voice session lets users create, manage and present startup ideas through natural voice commands with sub-second response times.",
        "linear-gradient(135deg, #a8edea 0%, #fed6e3 100%)",
    ),
    (
        "AI-Powered Tools & Features",
        "Voice commands trigger navigation tools, presentation controls, utility functions and project information tools, from startup generation to pitch creation and market validation.",
        "linear-gradient(135deg, #ffecd2 0%, #fcb69f 100%)",
    ),
    (
        "Technology Stack",
        "A realtime speech model handles the conversation, speech recognition turns audio into text, and a modular service architecture registers endpoints dynamically.",
        "linear-gradient(135deg, #ff9a9e 0%, #fecfef 100%)",
    ),
    (
        "Target Audience & Use Cases",
        "Founders validating ideas, incubators and accelerators, analysts reviewing deal flow, and investors evaluating opportunities, through an API, a command line or a visual interface.",
        "linear-gradient(135deg, #a18cd1 0%, #fbc2eb 100%)",
    ),
    (
        "Architecture & Design Philosophy",
        "A modular, API-first design with distributed agent orchestration. Each generation request is routed to a specialised endpoint so every domain scales and reasons independently.",
        "linear-gradient(135deg, #fad0c4 0%, #ffd1ff 100%)",
    ),
    (
        "Key Benefits & Impact",
        "It surfaces opportunities, validates concepts, generates investor-grade material, delivers pitches and iterates on feedback. A co-founder, strategist and pitch coach in one.",
        "linear-gradient(135deg, #ffecd2 0%, #fcb69f 100%)",
    ),
    (
        "Future Vision & Roadmap",
        "Next come workflow orchestration, richer AI capabilities, external API integrations and enterprise features, growing into a framework others can embed in their own workflows.",
        "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
    ),
];

const VOICE_DEMO: &[(&str, &str, &str)] = &[
    (
        "Talk To This Deck",
        "Say next slide, previous slide or go to slide three and the presentation follows.",
        "linear-gradient(135deg, #43e97b 0%, #38f9d7 100%)",
    ),
    (
        "Hands-Free Narration",
        "Every slide is read aloud when it appears, and the deck moves on by itself once the narration has had time to finish.",
        "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)",
    ),
    (
        "Stay In Control",
        "Pause, resume, reset or ask for more time on a slide at any point in the conversation.",
        "linear-gradient(135deg, #fa709a 0%, #fee140 100%)",
    ),
];

fn build(id: &str, title: &str, slides: &[(&str, &str, &str)]) -> Presentation {
    Presentation::new(
        id,
        title,
        slides
            .iter()
            .map(|(title, content, background)| Slide::new(title, content).with_background(background))
            .collect(),
    )
}

pub const BUILTIN_IDS: [&str; 2] = ["unicorn-startup-creator", "voice-demo"];

/// Decks that ship with the application.
pub fn builtin(id: &str) -> Option<Presentation> {
    match id {
        "unicorn-startup-creator" => Some(build(id, "Unicorn Startup Creator & Presenter", UNICORN)),
        "voice-demo" => Some(build(id, "Voice Control Demo", VOICE_DEMO)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_decks_resolve() {
        for id in BUILTIN_IDS {
            let deck = builtin(id).unwrap();
            assert_eq!(deck.id, id);
            assert!(!deck.is_empty());
        }
        assert_eq!(builtin("unicorn-startup-creator").unwrap().len(), 12);
        assert!(builtin("missing").is_none());
    }

    #[test]
    fn narration_text_joins_title_and_content() {
        let slide = Slide::new("Intro", "Hello world");
        assert_eq!(slide.narration_text(), "Intro. Hello world");
    }
}
