//! Console command parsing.

use openai_realtime::types::audio::Voice;

pub const HELP: &str = "\
Commands:
  start                 start a voice session
  stop                  end the voice session
  toggle                start or stop
  voice <name>          voice for the next session
  say <text>            send a text message to the assistant
  open <id>             open a presentation (unicorn-startup-creator, voice-demo)
  tool <name> [json]    run a tool by hand
  log                   print the conversation log
  status                session, route and presentation state
  help                  this text
  quit                  stop and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Toggle,
    Voice(Voice),
    Say(String),
    Open(String),
    Tool { name: String, arguments: String },
    Log,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command `{0}`, type `help` for the list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
}

/// Parses one input line. Blank lines are `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let required = |name: &'static str| {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word.to_lowercase().as_str() {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "toggle" => Command::Toggle,
        "voice" => Command::Voice(required("voice")?.parse::<Voice>().unwrap_or_else(|never| match never {})),
        "say" => Command::Say(required("say")?),
        "open" => Command::Open(required("open")?),
        "tool" => {
            let rest = required("tool")?;
            let (name, arguments) = match rest.split_once(char::is_whitespace) {
                Some((name, arguments)) => (name.to_string(), arguments.trim().to_string()),
                None => (rest.clone(), "{}".to_string()),
            };
            Command::Tool { name, arguments }
        }
        "log" => Command::Log,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
