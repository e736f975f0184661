use crate::backends::{ContentGenerator, Scraper};
use crate::bridge::PresentationBridge;
use crate::navigation;
use crate::shell::AppShell;
use crate::tools::{ToolName, ToolResult};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CONFETTI: Duration = Duration::from_secs(5);

/// One implementation per [`ToolName`]. Expected failures come back as
/// `success: false` results; nothing here returns an error.
#[derive(Clone)]
pub struct ToolFunctions {
    shell: Arc<AppShell>,
    bridge: PresentationBridge,
    generator: Arc<dyn ContentGenerator>,
    scraper: Arc<dyn Scraper>,
    timeout: Duration,
    max_scrape_chars: usize,
}

impl ToolFunctions {
    pub fn new(
        shell: Arc<AppShell>,
        bridge: PresentationBridge,
        generator: Arc<dyn ContentGenerator>,
        scraper: Arc<dyn Scraper>,
    ) -> Self {
        Self {
            shell,
            bridge,
            generator,
            scraper,
            timeout: Duration::from_secs(30),
            max_scrape_chars: 6000,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_scrape_chars(mut self, max_scrape_chars: usize) -> Self {
        self.max_scrape_chars = max_scrape_chars;
        self
    }

    /// Runs the tool the model asked for by wire name, with its raw JSON
    /// arguments. A panicking implementation still yields a failure result.
    pub async fn invoke(&self, name: &str, arguments: &str) -> ToolResult {
        let tool: ToolName = match name.parse() {
            Ok(tool) => tool,
            Err(_) => {
                tracing::warn!(name, "model called an unknown tool");
                return ToolResult::failure(format!("I don't have a tool called \"{name}\"."));
            }
        };
        let args = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %tool, "unreadable tool arguments: {}", e);
                return ToolResult::failure(format!(
                    "The arguments for {tool} could not be read, please try again."
                ));
            }
        };

        match AssertUnwindSafe(self.call(tool, &args)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(tool = %tool, "tool implementation panicked");
                ToolResult::failure(format!("Something went wrong while running {tool}."))
            }
        }
    }

    pub async fn call(&self, tool: ToolName, args: &Value) -> ToolResult {
        tracing::debug!(tool = %tool, %args, "running tool");
        match tool {
            ToolName::GetCurrentTime => self.current_time(),
            ToolName::ChangeBackgroundColor => {
                let theme = self.shell.toggle_theme();
                ToolResult::ok(format!("Switched to {} mode.", theme.as_str())).with_field("theme", theme.as_str())
            }
            ToolName::PartyMode => {
                self.shell.celebrate(CONFETTI);
                ToolResult::ok("Party mode activated! Confetti is flying across the page.")
            }
            ToolName::LaunchWebsite => self.launch_website(args),
            ToolName::CopyToClipboard => match string_arg(args, "text") {
                Some(text) => {
                    self.shell.copy(&text);
                    ToolResult::ok("The text was copied to the clipboard.")
                }
                None => ToolResult::failure("Tell me what text to copy."),
            },
            ToolName::ScrapeWebsite => self.scrape_website(args).await,
            ToolName::GenerateContent => self.generate_content(args).await,
            ToolName::NavigateToPage => self.navigate_to_page(args),
            ToolName::NextSlide => self.bridge.next_slide(),
            ToolName::PreviousSlide => self.bridge.previous_slide(),
            ToolName::GoToSlideNumber => match number_arg(args, "slideNumber") {
                Some(number) if number >= 1 => self.bridge.go_to_slide(number as usize),
                Some(number) => ToolResult::failure(format!(
                    "Slide {number} doesn't exist, slides are numbered from 1."
                )),
                None => ToolResult::failure("Tell me which slide number to go to."),
            },
            ToolName::FirstSlide => self.bridge.first_slide(),
            ToolName::LastSlide => self.bridge.last_slide(),
            ToolName::TogglePause => self.bridge.toggle_pause(),
            ToolName::ToggleFullscreen => self.bridge.toggle_fullscreen(),
            ToolName::ExitPresentation => self.bridge.exit(),
            ToolName::ResetPresentation => self.bridge.reset(),
            ToolName::NarrateSlide => match number_arg(args, "slideNumber") {
                Some(number) if number < 1 => ToolResult::failure(format!(
                    "Slide {number} doesn't exist, slides are numbered from 1."
                )),
                number => self.bridge.narrate(number.map(|n| n as usize)),
            },
            ToolName::ExtendSlideTime => self.bridge.extend_current_slide_timing(),
        }
    }

    fn current_time(&self) -> ToolResult {
        let now = chrono::Local::now();
        ToolResult::ok(format!(
            "The current time is {} (UTC{}).",
            now.format("%H:%M:%S"),
            now.format("%:z")
        ))
        .with_field("time", now.to_rfc3339())
    }

    fn launch_website(&self, args: &Value) -> ToolResult {
        let url = match web_url(args) {
            Ok(url) => url,
            Err(message) => return ToolResult::failure(message),
        };
        self.shell.open_url(url.as_str());
        ToolResult::ok(format!(
            "Website {url} launched, inform the user that the website has been launched."
        ))
        .with_field("url", url.as_str())
    }

    async fn scrape_website(&self, args: &Value) -> ToolResult {
        let url = match web_url(args) {
            Ok(url) => url,
            Err(message) => return ToolResult::failure(message),
        };
        match tokio::time::timeout(self.timeout, self.scraper.scrape(url.as_str())).await {
            Ok(Ok(page)) => {
                let (markdown, truncated) = truncate_chars(&page.markdown, self.max_scrape_chars);
                let content = serde_json::to_string(&markdown).unwrap_or_default();
                let mut result = ToolResult::ok(format!(
                    "Here is the content of the scraped website: {content}. \
                     Summarize and explain it to the user now in the response."
                ))
                .with_field("url", url.as_str())
                .with_field("truncated", truncated);
                if let Some(title) = page.title {
                    result = result.with_field("title", title);
                }
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(%url, "scrape failed: {}", e);
                ToolResult::failure(format!("Failed to scrape {url}: {e}.")).with_field("url", url.as_str())
            }
            Err(_) => {
                tracing::warn!(%url, timeout = ?self.timeout, "scrape timed out");
                ToolResult::failure(format!(
                    "Failed to scrape {url}: the scraping service did not answer within {} seconds.",
                    self.timeout.as_secs()
                ))
                .with_field("url", url.as_str())
            }
        }
    }

    async fn generate_content(&self, args: &Value) -> ToolResult {
        let Some(prompt) = string_arg(args, "prompt").filter(|p| !p.trim().is_empty()) else {
            return ToolResult::failure("Tell me what the content should be about.");
        };
        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(content)) => ToolResult::ok(format!(
                "Here is the generated content: {content}\nShare the highlights with the user."
            ))
            .with_field("content", content),
            Ok(Err(e)) => {
                tracing::warn!("content generation failed: {}", e);
                ToolResult::failure(format!("Failed to generate content: {e}."))
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "content generation timed out");
                ToolResult::failure(format!(
                    "Failed to generate content: the generation service did not answer within {} seconds.",
                    self.timeout.as_secs()
                ))
            }
        }
    }

    fn navigate_to_page(&self, args: &Value) -> ToolResult {
        let page = string_arg(args, "page").unwrap_or_default();
        match navigation::resolve(&page) {
            Some(route) => {
                self.shell.navigate(route);
                let detail = if route == navigation::ROOT_ROUTE {
                    "This is the main page of the site."
                } else {
                    "Page loaded."
                };
                ToolResult::ok(format!("Successfully navigated to page \"{page}\". {detail}")).with_field("route", route)
            }
            None => ToolResult::failure(format!(
                "Page \"{page}\" not found. Available pages: {}.",
                navigation::available_pages().join(", ")
            ))
            .with_field("availablePages", navigation::available_pages()),
        }
    }
}

fn parse_arguments(arguments: &str) -> Result<Value, serde_json::Error> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_json::from_str(arguments)?;
    Ok(if value.is_null() { Value::Object(Map::new()) } else { value })
}

fn string_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Accepts numbers and numeric strings, since models send both.
fn number_arg(args: &Value, key: &str) -> Option<i64> {
    match args.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// http(s) URL from the `url` argument. A bare host gets `https://`.
fn web_url(args: &Value) -> Result<Url, String> {
    let Some(raw) = string_arg(args, "url").map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
        return Err("Tell me which website address to use.".to_string());
    };
    let candidate = if raw.contains("://") { raw.clone() } else { format!("https://{raw}") };
    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(url),
        Ok(url) => Err(format!(
            "\"{raw}\" uses the {} scheme, only http and https websites are supported.",
            url.scheme()
        )),
        Err(_) => Err(format!("\"{raw}\" is not a valid website address.")),
    }
}

fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((cut, _)) => (format!("{} [truncated]", &text[..cut]), true),
        None => (text.to_string(), false),
    }
}
