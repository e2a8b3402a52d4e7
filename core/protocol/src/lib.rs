use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// System instruction sent with agent requests; the reply must be a plan.
pub const PLAN_INSTRUCTION: &str = "Respond ONLY with a valid JSON array. \
Each element is an object {\"action\": <name>, \"arg\": <string, optional>}. \
Allowed actions: pwd, list_dir, read_file (arg is the file path).";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub model: String,
}

/// The closed set of read-only actions an agent plan may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Pwd,
    ListDir,
    ReadFile,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::Pwd, Self::ListDir, Self::ReadFile];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pwd => "pwd",
            Self::ListDir => "list_dir",
            Self::ReadFile => "read_file",
        }
    }

    pub fn takes_argument(self) -> bool {
        matches!(self, Self::ReadFile)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Action name as proposed by a plan. Names outside the whitelist are kept
/// so they can be shown to the user and then denied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionName {
    Listed(ActionKind),
    Unlisted(String),
}

impl ActionName {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Self::Listed(kind) => Some(*kind),
            Self::Unlisted(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Listed(kind) => kind.as_str(),
            Self::Unlisted(name) => name,
        }
    }
}

impl From<String> for ActionName {
    fn from(name: String) -> Self {
        match name.parse::<ActionKind>() {
            Ok(kind) => Self::Listed(kind),
            Err(_) => Self::Unlisted(name),
        }
    }
}

impl From<ActionName> for String {
    fn from(name: ActionName) -> Self {
        name.as_str().to_string()
    }
}

impl From<ActionKind> for ActionName {
    fn from(kind: ActionKind) -> Self {
        Self::Listed(kind)
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action: ActionName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
}

impl AgentStep {
    pub fn new(action: ActionKind, arg: Option<String>) -> Self {
        Self {
            action: action.into(),
            arg,
        }
    }

    /// `<action> <arg>` with an empty argument rendered as nothing.
    pub fn describe(&self) -> String {
        format!("{} {}", self.action, self.arg.as_deref().unwrap_or(""))
    }
}
