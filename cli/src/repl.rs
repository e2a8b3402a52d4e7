use std::io::{self, BufRead, Write};

use actions::ActionBackend;
use agent::{parse_checkpoint_index, AgentError, Orchestrator, PlanSupervisor, Session, StepOutcome};
use protocol::AgentStep;
use providers::provider_trait::Provider;

use crate::command::{classify, Command, Input};
use crate::render::Renderer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints `question` and reads one answer line. End of input counts as no.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}

pub struct Repl<P, A, R, W>
where
    P: Provider,
    A: ActionBackend,
    R: BufRead,
    W: Write,
{
    orchestrator: Orchestrator<P, A>,
    session: Session,
    agent_mode: bool,
    renderer: Renderer,
    config_source: String,
    input: R,
    output: W,
}

impl<P, A, R, W> Repl<P, A, R, W>
where
    P: Provider,
    A: ActionBackend,
    R: BufRead,
    W: Write,
{
    pub fn new(
        orchestrator: Orchestrator<P, A>,
        session: Session,
        renderer: Renderer,
        config_source: String,
        input: R,
        output: W,
    ) -> Self {
        Self {
            orchestrator,
            session,
            agent_mode: false,
            renderer,
            config_source,
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn agent_mode(&self) -> bool {
        self.agent_mode
    }

    pub fn run(&mut self) -> io::Result<()> {
        let model = self.orchestrator.provider_config().model.clone();
        self.renderer.banner(&mut self.output, &model)?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            if self.handle_line(&line)? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match classify(line) {
            Input::Blank => {}
            Input::Rewind(raw) => self.rewind(raw)?,
            Input::Command(cmd) => return self.command(cmd),
            Input::Unknown(word) => {
                tracing::debug!(command = word, "unrecognized command");
                writeln!(self.output, "Unknown command. Type /help for available commands.\n")?;
            }
            Input::Content(text) if self.agent_mode => self.agent_request(text)?,
            Input::Content(text) => self.chat(text)?,
        }
        Ok(Flow::Continue)
    }

    fn command(&mut self, cmd: Command) -> io::Result<Flow> {
        let model = self.orchestrator.provider_config().model.clone();
        match cmd {
            Command::Exit => {
                if ask(&mut self.input, &mut self.output, "Exit? y/n: ")? {
                    writeln!(self.output, "Goodbye.")?;
                    return Ok(Flow::Exit);
                }
            }
            Command::Clear => {
                self.session.reset();
                writeln!(self.output, "\nContext cleared.\n")?;
            }
            Command::Cls => {
                self.renderer.clear_screen(&mut self.output)?;
                self.renderer.banner(&mut self.output, &model)?;
            }
            Command::Help => self.renderer.help(&mut self.output, &model)?,
            Command::Config => {
                writeln!(
                    self.output,
                    "Config menu not modified here (provider {}, model {}, loaded from {}).",
                    self.orchestrator.provider_name(),
                    model,
                    self.config_source
                )?;
            }
            Command::Agent => {
                self.agent_mode = !self.agent_mode;
                let state = if self.agent_mode { "enabled" } else { "disabled" };
                writeln!(self.output, "\nAgent mode {state}.\n")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn rewind(&mut self, raw: &str) -> io::Result<()> {
        let result = parse_checkpoint_index(raw).and_then(|index| self.session.rewind(index).map(|()| index));
        match result {
            Ok(index) => self.renderer.rewound(&mut self.output, index),
            Err(err) => writeln!(self.output, "{err}\n"),
        }
    }

    fn chat(&mut self, text: &str) -> io::Result<()> {
        match self.orchestrator.chat_turn(&mut self.session, text) {
            Ok(exchange) => {
                self.renderer.reply(&mut self.output, &exchange.reply)?;
                self.renderer.checkpoint(&mut self.output, exchange.checkpoint)
            }
            Err(err) => writeln!(self.output, "Request failed: {err}. Conversation unchanged.\n"),
        }
    }

    fn agent_request(&mut self, text: &str) -> io::Result<()> {
        let mut supervisor = TerminalSupervisor {
            input: &mut self.input,
            output: &mut self.output,
            failure: None,
        };
        let result = self.orchestrator.handle_agent_request(text, &mut supervisor);
        if let Some(err) = supervisor.failure.take() {
            return Err(err);
        }
        match result {
            Ok(_) => writeln!(self.output),
            Err(err @ AgentError::InvalidPlan { .. }) => writeln!(self.output, "{err}\n"),
            Err(err) => writeln!(self.output, "Agent request failed: {err}\n"),
        }
    }
}

/// Asks on the REPL's own input and output. The first I/O error is kept and
/// every later step is declined.
struct TerminalSupervisor<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
    failure: Option<io::Error>,
}

impl<R: BufRead, W: Write> TerminalSupervisor<'_, R, W> {
    fn try_approve(&mut self, step: &AgentStep) -> io::Result<bool> {
        writeln!(self.output, "\nProposed action: {}", step.describe())?;
        ask(&mut *self.input, &mut *self.output, "Execute? y/n: ")
    }

    fn try_report(&mut self, outcome: &StepOutcome) -> io::Result<()> {
        match outcome {
            StepOutcome::Invalid => writeln!(self.output, "Invalid agent step."),
            StepOutcome::Skipped(_) => writeln!(self.output, "Skipped."),
            StepOutcome::Executed { result, .. } => {
                let text = match result {
                    Ok(text) => text.clone(),
                    Err(denied) => denied.to_string(),
                };
                writeln!(self.output, "\nResult:\n{text}")
            }
        }
    }
}

impl<R: BufRead, W: Write> PlanSupervisor for TerminalSupervisor<'_, R, W> {
    fn approve(&mut self, step: &AgentStep) -> bool {
        if self.failure.is_some() {
            return false;
        }
        self.try_approve(step).unwrap_or_else(|err| {
            self.failure = Some(err);
            false
        })
    }

    fn report(&mut self, outcome: &StepOutcome) {
        if self.failure.is_some() {
            return;
        }
        if let Err(err) = self.try_report(outcome) {
            self.failure = Some(err);
        }
    }
}
