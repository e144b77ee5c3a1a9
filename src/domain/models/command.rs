#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

pub const WEATHER_PREFIX: &str = "#weather";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Plain,
    Weather,
}

impl CommandKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            CommandKind::Plain => return "/v1/chat/",
            CommandKind::Weather => return "/v1/chat_with_functions/",
        }
    }
}

/// A prompt classified once at the boundary. The payload is sent as typed,
/// prefix included, since the function calling endpoint expects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub payload: String,
}

impl Command {
    pub fn parse(text: &str) -> Command {
        let mut kind = CommandKind::Plain;
        if text.starts_with(WEATHER_PREFIX) {
            kind = CommandKind::Weather;
        }

        return Command {
            kind,
            payload: text.to_string(),
        };
    }
}
