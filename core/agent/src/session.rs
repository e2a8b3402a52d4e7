//! Conversation transcript with linear checkpoints.
//!
//! Index 0 always holds the bare system prompt. Every completed exchange
//! appends one more checkpoint, and rewinding to index `n` discards every
//! checkpoint after it.

use protocol::{ChatMessage, Role};
use providers::provider_trait::ProviderError;

use crate::error::AgentError;

/// A fully owned copy of the transcript. Never shares storage with the live
/// transcript or with other checkpoints.
pub type Checkpoint = Vec<ChatMessage>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exchange {
    pub reply: String,
    pub checkpoint: usize,
}

#[derive(Clone, Debug)]
pub struct Session {
    system_prompt: String,
    transcript: Vec<ChatMessage>,
    checkpoints: Vec<Checkpoint>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let mut session = Self {
            system_prompt: system_prompt.into(),
            transcript: Vec::new(),
            checkpoints: Vec::new(),
        };
        session.reset();
        session
    }

    /// Replaces transcript and checkpoints together with a fresh start.
    pub fn reset(&mut self) {
        self.transcript = vec![ChatMessage::system(self.system_prompt.clone())];
        self.checkpoints = vec![self.transcript.clone()];
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn latest_checkpoint(&self) -> usize {
        self.checkpoints.len() - 1
    }

    /// Runs one chat turn. The gateway sees the transcript plus the new user
    /// message; nothing is recorded unless it returns a reply.
    pub fn exchange<F>(&mut self, user_text: &str, gateway: F) -> Result<Exchange, AgentError>
    where
        F: FnOnce(&[ChatMessage]) -> Result<String, ProviderError>,
    {
        let mut outgoing = self.transcript.clone();
        outgoing.push(ChatMessage::user(user_text));
        let reply = gateway(&outgoing)?;

        outgoing.push(ChatMessage::assistant(reply.clone()));
        self.transcript = outgoing;
        let checkpoint = self.commit();
        Ok(Exchange { reply, checkpoint })
    }

    /// Snapshots the transcript. Only valid right after an assistant reply.
    pub(crate) fn commit(&mut self) -> usize {
        debug_assert_eq!(self.transcript.last().map(|m| m.role), Some(Role::Assistant));
        self.checkpoints.push(self.transcript.clone());
        let index = self.latest_checkpoint();
        tracing::debug!(checkpoint = index, messages = self.transcript.len(), "committed checkpoint");
        index
    }

    /// Restores checkpoint `index` and drops every later one. Out-of-range
    /// indices leave the session untouched.
    pub fn rewind(&mut self, index: usize) -> Result<(), AgentError> {
        let snapshot = self
            .checkpoints
            .get(index)
            .cloned()
            .ok_or(AgentError::InvalidCheckpoint)?;
        self.checkpoints.truncate(index + 1);
        self.transcript = snapshot;
        tracing::debug!(checkpoint = index, "rewound session");
        Ok(())
    }
}

/// Parses the index that follows the rewind prefix. Surrounding whitespace
/// is tolerated; signs other than `+`, and anything non-numeric, are not.
pub fn parse_checkpoint_index(text: &str) -> Result<usize, AgentError> {
    text.trim().parse::<usize>().map_err(|_| AgentError::InvalidCheckpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &'static str) -> impl FnOnce(&[ChatMessage]) -> Result<String, ProviderError> {
        move |_: &[ChatMessage]| Ok(text.to_string())
    }

    fn session_with_turns(n: usize) -> Session {
        let mut session = Session::new("sys");
        for i in 0..n {
            let user = format!("question {i}");
            session
                .exchange(&user, |_| Ok(format!("answer {i}")))
                .expect("exchange");
        }
        session
    }

    #[test]
    fn fresh_session_has_one_checkpoint() {
        let session = Session::new("sys");
        assert_eq!(session.transcript(), &[ChatMessage::system("sys")]);
        assert_eq!(session.checkpoints(), &[vec![ChatMessage::system("sys")]]);
        assert_eq!(session.latest_checkpoint(), 0);
    }

    #[test]
    fn each_turn_adds_one_checkpoint_matching_transcript() {
        for n in 0..5 {
            let session = session_with_turns(n);
            assert_eq!(session.checkpoints().len(), n + 1);
            assert_eq!(session.checkpoints()[n], session.transcript());
            assert_eq!(session.transcript().len(), 1 + 2 * n);
        }
    }

    #[test]
    fn gateway_sees_history_plus_new_message() {
        let mut session = session_with_turns(1);
        let mut seen = Vec::new();
        session
            .exchange("next", |msgs| {
                seen = msgs.to_vec();
                Ok("ok".to_string())
            })
            .expect("exchange");
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.last(), Some(&ChatMessage::user("next")));
    }

    #[test]
    fn failed_exchange_changes_nothing() {
        let mut session = session_with_turns(2);
        let before_transcript = session.transcript().to_vec();
        let before_checkpoints = session.checkpoints().to_vec();

        let err = session
            .exchange("boom", |_| Err(ProviderError::EmptyReply))
            .expect_err("gateway failure");
        assert!(matches!(err, AgentError::Provider(ProviderError::EmptyReply)));
        assert_eq!(session.transcript(), before_transcript.as_slice());
        assert_eq!(session.checkpoints(), before_checkpoints.as_slice());
    }

    #[test]
    fn checkpoints_are_independent_of_later_changes() {
        let mut session = session_with_turns(1);
        let captured = session.checkpoints()[1].clone();
        session.exchange("more", reply("text")).expect("exchange");
        session.rewind(0).expect("rewind");
        session.exchange("diverge", reply("other")).expect("exchange");
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[1], ChatMessage::user("question 0"));
    }

    #[test]
    fn rewind_truncates_future_history() {
        let mut session = session_with_turns(4);
        session.rewind(2).expect("rewind");
        assert_eq!(session.checkpoints().len(), 3);
        assert_eq!(session.transcript(), session.checkpoints()[2].as_slice());

        let exchange = session.exchange("fork", reply("forked")).expect("exchange");
        assert_eq!(exchange.checkpoint, 3);
        assert_eq!(session.checkpoints().len(), 4);
        assert_eq!(session.transcript()[5], ChatMessage::user("fork"));
    }

    #[test]
    fn rewind_twice_to_same_index_is_stable() {
        let mut session = session_with_turns(3);
        session.rewind(1).expect("rewind");
        let transcript = session.transcript().to_vec();
        session.rewind(1).expect("rewind again");
        assert_eq!(session.transcript(), transcript.as_slice());
        assert_eq!(session.checkpoints().len(), 2);
    }

    #[test]
    fn rewind_out_of_range_changes_nothing() {
        let mut session = session_with_turns(2);
        let before_transcript = session.transcript().to_vec();
        let before_checkpoints = session.checkpoints().to_vec();

        assert!(matches!(session.rewind(3), Err(AgentError::InvalidCheckpoint)));
        assert!(matches!(session.rewind(usize::MAX), Err(AgentError::InvalidCheckpoint)));
        assert_eq!(session.transcript(), before_transcript.as_slice());
        assert_eq!(session.checkpoints(), before_checkpoints.as_slice());
    }

    #[test]
    fn rewind_to_zero_after_reset_is_a_no_op() {
        let mut session = session_with_turns(2);
        session.reset();
        let fresh = session.clone();
        session.rewind(0).expect("rewind");
        assert_eq!(session.transcript(), fresh.transcript());
        assert_eq!(session.checkpoints(), fresh.checkpoints());
    }

    #[test]
    fn checkpoint_index_parsing() {
        assert_eq!(parse_checkpoint_index("3").ok(), Some(3));
        assert_eq!(parse_checkpoint_index(" 12 ").ok(), Some(12));
        assert!(matches!(parse_checkpoint_index("-1"), Err(AgentError::InvalidCheckpoint)));
        assert!(matches!(parse_checkpoint_index("two"), Err(AgentError::InvalidCheckpoint)));
        assert!(matches!(parse_checkpoint_index(""), Err(AgentError::InvalidCheckpoint)));
    }
}
