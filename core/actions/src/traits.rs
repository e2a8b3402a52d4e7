use protocol::{ActionKind, AgentStep};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;

use crate::decode::DecodePolicy;

pub const DEFAULT_MAX_READ_BYTES: u64 = 10_000;

/// Why an action produced no output. Shown to the user as the step result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionDenied {
    #[error("Action not allowed")]
    NotAllowed,
    #[error("Invalid file")]
    InvalidFile,
    #[error("File too large")]
    FileTooLarge,
    #[error("File is not valid UTF-8")]
    NotUtf8,
    #[error("Read failed: {0}")]
    Io(String),
}

pub trait ActionBackend {
    fn execute(&self, step: &AgentStep) -> Result<String, ActionDenied>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadPolicy {
    pub max_bytes: u64,
    pub decode: DecodePolicy,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_READ_BYTES,
            decode: DecodePolicy::default(),
        }
    }
}

/// Runs the whitelisted read-only actions against a working directory.
/// Nothing here writes, deletes, or spawns processes.
#[derive(Clone, Debug)]
pub struct LocalActionBackend {
    root: PathBuf,
    read_policy: ReadPolicy,
}

impl LocalActionBackend {
    pub fn new(root: impl Into<PathBuf>, read_policy: ReadPolicy) -> Self {
        Self {
            root: root.into(),
            read_policy,
        }
    }

    pub fn from_current_dir(read_policy: ReadPolicy) -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?, read_policy))
    }

    fn list_dir(&self) -> Result<String, ActionDenied> {
        let read_dir = fs::read_dir(&self.root).map_err(|err| ActionDenied::Io(err.to_string()))?;
        let mut names = read_dir
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names.join("\n"))
    }

    fn read_file(&self, arg: Option<&str>) -> Result<String, ActionDenied> {
        let requested = arg.filter(|a| !a.is_empty()).ok_or(ActionDenied::InvalidFile)?;
        let path = self.root.join(requested);

        let meta = fs::metadata(&path).map_err(|_| ActionDenied::InvalidFile)?;
        if !meta.is_file() {
            return Err(ActionDenied::InvalidFile);
        }
        let max = self.read_policy.max_bytes;
        if meta.len() > max {
            return Err(ActionDenied::FileTooLarge);
        }

        let mut bytes = Vec::with_capacity(meta.len() as usize);
        File::open(&path)
            .and_then(|f| f.take(max.saturating_add(1)).read_to_end(&mut bytes))
            .map_err(|err| ActionDenied::Io(err.to_string()))?;
        // the file grew between stat and read
        if bytes.len() as u64 > max {
            return Err(ActionDenied::FileTooLarge);
        }

        self.read_policy.decode.decode(&bytes).ok_or(ActionDenied::NotUtf8)
    }
}

impl ActionBackend for LocalActionBackend {
    fn execute(&self, step: &AgentStep) -> Result<String, ActionDenied> {
        let Some(kind) = step.action.kind() else {
            tracing::debug!(action = %step.action, "denied unlisted action");
            return Err(ActionDenied::NotAllowed);
        };
        tracing::debug!(action = %kind, arg = ?step.arg, "executing action");
        match kind {
            ActionKind::Pwd => Ok(self.root.display().to_string()),
            ActionKind::ListDir => self.list_dir(),
            ActionKind::ReadFile => self.read_file(step.arg.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::ActionName;
    use tempfile::tempdir;

    fn read_step(path: &str) -> AgentStep {
        AgentStep::new(ActionKind::ReadFile, Some(path.to_string()))
    }

    #[test]
    fn pwd_reports_root() {
        let dir = tempdir().expect("tempdir");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        let out = backend.execute(&AgentStep::new(ActionKind::Pwd, None)).expect("pwd");
        assert_eq!(out, dir.path().display().to_string());
    }

    #[test]
    fn list_dir_is_sorted_and_newline_joined() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("b.txt"), "b").expect("write");
        fs::write(dir.path().join(".hidden"), "h").expect("write");
        fs::create_dir(dir.path().join("a")).expect("mkdir");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        let out = backend.execute(&AgentStep::new(ActionKind::ListDir, None)).expect("list");
        assert_eq!(out, ".hidden\na\nb.txt");
    }

    #[test]
    fn read_file_at_limit_returns_contents() {
        let dir = tempdir().expect("tempdir");
        let body = "x".repeat(10_000);
        fs::write(dir.path().join("exact.txt"), &body).expect("write");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        assert_eq!(backend.execute(&read_step("exact.txt")), Ok(body));
    }

    #[test]
    fn read_file_with_unbounded_limit_returns_contents() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "hello").expect("write");
        let backend = LocalActionBackend::new(
            dir.path(),
            ReadPolicy {
                max_bytes: u64::MAX,
                ..ReadPolicy::default()
            },
        );
        assert_eq!(backend.execute(&read_step("a.txt")).as_deref(), Ok("hello"));
    }

    #[test]
    fn read_file_over_limit_is_too_large() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("big.txt"), "x".repeat(10_001)).expect("write");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        assert_eq!(backend.execute(&read_step("big.txt")), Err(ActionDenied::FileTooLarge));
    }

    #[test]
    fn missing_paths_and_directories_are_invalid() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        assert_eq!(backend.execute(&read_step("nope.txt")), Err(ActionDenied::InvalidFile));
        assert_eq!(backend.execute(&read_step("sub")), Err(ActionDenied::InvalidFile));
        assert_eq!(backend.execute(&read_step("")), Err(ActionDenied::InvalidFile));
        assert_eq!(
            backend.execute(&AgentStep::new(ActionKind::ReadFile, None)),
            Err(ActionDenied::InvalidFile)
        );
    }

    #[test]
    fn absolute_paths_are_honoured() {
        let dir = tempdir().expect("tempdir");
        let other = tempdir().expect("tempdir");
        let file = other.path().join("note.md");
        fs::write(&file, "# note").expect("write");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        let out = backend.execute(&read_step(&file.display().to_string()));
        assert_eq!(out.as_deref(), Ok("# note"));
    }

    #[test]
    fn decode_policy_controls_binary_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("bin"), b"ok\xff\xfe!").expect("write");

        let lenient = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        assert_eq!(lenient.execute(&read_step("bin")).as_deref(), Ok("ok!"));

        let strict = LocalActionBackend::new(
            dir.path(),
            ReadPolicy {
                decode: DecodePolicy::Strict,
                ..ReadPolicy::default()
            },
        );
        assert_eq!(strict.execute(&read_step("bin")), Err(ActionDenied::NotUtf8));
    }

    #[test]
    fn unlisted_actions_are_not_allowed() {
        let dir = tempdir().expect("tempdir");
        let backend = LocalActionBackend::new(dir.path(), ReadPolicy::default());
        let step = AgentStep {
            action: ActionName::Unlisted("delete_file".to_string()),
            arg: Some("x".to_string()),
        };
        assert_eq!(backend.execute(&step), Err(ActionDenied::NotAllowed));
        assert_eq!(ActionDenied::NotAllowed.to_string(), "Action not allowed");
    }
}
