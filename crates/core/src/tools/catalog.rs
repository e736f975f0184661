//! The tools the speech model may call.
//!
//! [`ToolName`] is the single list of tools. Descriptions, parameter schemas
//! and the dispatch in `functions.rs` all match on it exhaustively, so a tool
//! cannot be declared without an implementation or the other way round.

use crate::error::CatalogError;
use openai_realtime_types::tools::{FunctionTool, Tool};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetCurrentTime,
    ChangeBackgroundColor,
    PartyMode,
    LaunchWebsite,
    CopyToClipboard,
    ScrapeWebsite,
    GenerateContent,
    NavigateToPage,
    NextSlide,
    PreviousSlide,
    GoToSlideNumber,
    FirstSlide,
    LastSlide,
    TogglePause,
    ToggleFullscreen,
    ExitPresentation,
    ResetPresentation,
    NarrateSlide,
    ExtendSlideTime,
}

impl ToolName {
    pub const ALL: [ToolName; 19] = [
        ToolName::GetCurrentTime,
        ToolName::ChangeBackgroundColor,
        ToolName::PartyMode,
        ToolName::LaunchWebsite,
        ToolName::CopyToClipboard,
        ToolName::ScrapeWebsite,
        ToolName::GenerateContent,
        ToolName::NavigateToPage,
        ToolName::NextSlide,
        ToolName::PreviousSlide,
        ToolName::GoToSlideNumber,
        ToolName::FirstSlide,
        ToolName::LastSlide,
        ToolName::TogglePause,
        ToolName::ToggleFullscreen,
        ToolName::ExitPresentation,
        ToolName::ResetPresentation,
        ToolName::NarrateSlide,
        ToolName::ExtendSlideTime,
    ];

    /// Wire name seen by the model. Stable.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetCurrentTime => "getCurrentTime",
            ToolName::ChangeBackgroundColor => "changeBackgroundColor",
            ToolName::PartyMode => "partyMode",
            ToolName::LaunchWebsite => "launchWebsite",
            ToolName::CopyToClipboard => "copyToClipboard",
            ToolName::ScrapeWebsite => "scrapeWebsite",
            ToolName::GenerateContent => "generateContent",
            ToolName::NavigateToPage => "navigateToPage",
            ToolName::NextSlide => "nextSlide",
            ToolName::PreviousSlide => "previousSlide",
            ToolName::GoToSlideNumber => "goToSlideNumber",
            ToolName::FirstSlide => "firstSlide",
            ToolName::LastSlide => "lastSlide",
            ToolName::TogglePause => "togglePause",
            ToolName::ToggleFullscreen => "toggleFullscreen",
            ToolName::ExitPresentation => "exitPresentation",
            ToolName::ResetPresentation => "resetPresentation",
            ToolName::NarrateSlide => "narrateSlide",
            ToolName::ExtendSlideTime => "extendSlideTime",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::GetCurrentTime => "Gets the current time in the user's timezone",
            ToolName::ChangeBackgroundColor => "Toggles the page between light and dark mode",
            ToolName::PartyMode => "Triggers a confetti animation on the page",
            ToolName::LaunchWebsite => "Launches a website in the user's browser",
            ToolName::CopyToClipboard => "Copies text to the user's clipboard",
            ToolName::ScrapeWebsite => "Scrapes a URL and returns its content as markdown",
            ToolName::GenerateContent => {
                "Generates startup project content (technical details, problem statement, business model) from a prompt"
            }
            ToolName::NavigateToPage => "Navigates to a specific page on the website",
            ToolName::NextSlide => "Moves to the next slide in a presentation",
            ToolName::PreviousSlide => "Moves to the previous slide in a presentation",
            ToolName::GoToSlideNumber => "Jumps to a specific slide number in a presentation",
            ToolName::FirstSlide => "Moves to the first slide in a presentation",
            ToolName::LastSlide => "Moves to the last slide in a presentation",
            ToolName::TogglePause => "Pauses or resumes a presentation",
            ToolName::ToggleFullscreen => "Toggles fullscreen mode for a presentation",
            ToolName::ExitPresentation => "Exits the current presentation mode",
            ToolName::ResetPresentation => "Restarts the presentation from the first slide and resumes auto-play",
            ToolName::NarrateSlide => "Narrates a slide of the presentation, the current one if no number is given",
            ToolName::ExtendSlideTime => "Gives the current slide more time before the presentation moves on",
        }
    }

    /// Named parameters as (name, JSON type, description).
    fn params(&self) -> &'static [(&'static str, &'static str, &'static str)] {
        match self {
            ToolName::LaunchWebsite => &[("url", "string", "The URL to launch")],
            ToolName::CopyToClipboard => &[("text", "string", "The text to copy")],
            ToolName::ScrapeWebsite => &[("url", "string", "The URL to scrape")],
            ToolName::GenerateContent => &[("prompt", "string", "What to write about")],
            ToolName::NavigateToPage => &[(
                "page",
                "string",
                "The page to navigate to (e.g., \"home\", \"about\", \"features\", \"settings\", \"presentations\")",
            )],
            ToolName::GoToSlideNumber => &[("slideNumber", "number", "The slide number to jump to (1-based index)")],
            ToolName::NarrateSlide => &[("slideNumber", "number", "Optional slide number to narrate (1-based index)")],
            ToolName::GetCurrentTime
            | ToolName::ChangeBackgroundColor
            | ToolName::PartyMode
            | ToolName::NextSlide
            | ToolName::PreviousSlide
            | ToolName::FirstSlide
            | ToolName::LastSlide
            | ToolName::TogglePause
            | ToolName::ToggleFullscreen
            | ToolName::ExitPresentation
            | ToolName::ResetPresentation
            | ToolName::ExtendSlideTime => &[],
        }
    }

    fn required(&self) -> &'static [&'static str] {
        match self {
            ToolName::LaunchWebsite | ToolName::ScrapeWebsite => &["url"],
            ToolName::CopyToClipboard => &["text"],
            ToolName::GenerateContent => &["prompt"],
            ToolName::NavigateToPage => &["page"],
            ToolName::GoToSlideNumber => &["slideNumber"],
            _ => &[],
        }
    }

    /// JSON schema for the arguments object.
    pub fn parameters(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .params()
            .iter()
            .map(|(name, kind, description)| {
                (name.to_string(), json!({ "type": kind, "description": description }))
            })
            .collect();
        let mut schema = json!({ "type": "object", "properties": properties });
        if !self.required().is_empty() {
            schema["required"] = json!(self.required());
        }
        schema
    }

    pub fn to_tool(&self) -> Tool {
        Tool::Function(FunctionTool::new(self.as_str(), self.description(), self.parameters()))
    }

    /// Whether the tool waits on a network service.
    pub fn is_networked(&self) -> bool {
        matches!(self, ToolName::ScrapeWebsite | ToolName::GenerateContent)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownTool(s.to_string()))
    }
}

/// The tools offered to one session, in negotiation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCatalog {
    tools: Vec<ToolName>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolCatalog {
    pub fn standard() -> Self {
        Self {
            tools: ToolName::ALL.to_vec(),
        }
    }

    /// Builds a catalog from wire names, rejecting unknown and repeated names.
    pub fn from_names<I, S>(names: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut tools = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            let tool: ToolName = name.parse()?;
            if !seen.insert(tool) {
                return Err(CatalogError::DuplicateTool(name.to_string()));
            }
            tools.push(tool);
        }
        if tools.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[ToolName] {
        &self.tools
    }

    pub fn contains(&self, tool: ToolName) -> bool {
        self.tools.contains(&tool)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn function_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolName::to_tool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn wire_names_are_unique() {
        let names: HashSet<_> = ToolName::ALL.iter().map(ToolName::as_str).collect();
        assert_eq!(names.len(), ToolName::ALL.len());
    }

    #[test]
    fn screenshot_is_not_a_tool() {
        assert_eq!(
            "takeScreenshot".parse::<ToolName>(),
            Err(CatalogError::UnknownTool("takeScreenshot".into()))
        );
    }

    #[test]
    fn schemas_are_objects() {
        for tool in ToolName::ALL {
            let schema = tool.parameters();
            assert_eq!(schema["type"], "object", "{tool}");
            assert!(schema["properties"].is_object(), "{tool}");
        }
        let schema = ToolName::GoToSlideNumber.parameters();
        assert_eq!(schema["properties"]["slideNumber"]["type"], "number");
        assert_eq!(schema["required"], json!(["slideNumber"]));
        assert!(ToolName::NarrateSlide.parameters().get("required").is_none());
    }

    #[test]
    fn catalog_from_names() {
        let catalog = ToolCatalog::from_names(["nextSlide", "navigateToPage"]).unwrap();
        assert_eq!(catalog.tools(), &[ToolName::NextSlide, ToolName::NavigateToPage]);
        assert_eq!(catalog.function_tools()[1].name(), "navigateToPage");

        assert_eq!(
            ToolCatalog::from_names(["nextSlide", "nextSlide"]),
            Err(CatalogError::DuplicateTool("nextSlide".into()))
        );
        assert_eq!(
            ToolCatalog::from_names(["nextSlide", "rewind"]),
            Err(CatalogError::UnknownTool("rewind".into()))
        );
        assert_eq!(ToolCatalog::from_names(Vec::<String>::new()), Err(CatalogError::Empty));
    }

    #[test]
    fn standard_catalog_offers_every_tool() {
        let catalog = ToolCatalog::standard();
        assert_eq!(catalog.len(), ToolName::ALL.len());
        assert_eq!(catalog.function_tools().len(), ToolName::ALL.len());
    }
}
