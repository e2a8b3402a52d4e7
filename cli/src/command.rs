pub const REWIND_PREFIX: &str = "<<";
pub const COMMAND_PREFIX: char = '/';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Cls,
    Help,
    Config,
    Agent,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Self::Exit,
        Self::Clear,
        Self::Cls,
        Self::Help,
        Self::Config,
        Self::Agent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exit => "/exit",
            Self::Clear => "/clear",
            Self::Cls => "/cls",
            Self::Help => "/help",
            Self::Config => "/config",
            Self::Agent => "/agent",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::Exit => "Exit the CLI",
            Self::Clear => "Clear conversation",
            Self::Cls => "Clear console",
            Self::Help => "Show help",
            Self::Config => "Show configuration",
            Self::Agent => "Toggle agent mode",
        }
    }

    fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.name() == input)
    }
}

/// One line of user input, classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Blank,
    /// Text after the rewind prefix, not yet validated.
    Rewind(&'a str),
    Command(Command),
    Unknown(&'a str),
    Content(&'a str),
}

pub fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    if let Some(rest) = line.strip_prefix(REWIND_PREFIX) {
        return Input::Rewind(rest);
    }
    if let Some(cmd) = Command::parse(line) {
        return Input::Command(cmd);
    }
    if line.starts_with(COMMAND_PREFIX) {
        return Input::Unknown(line);
    }
    Input::Content(line)
}
