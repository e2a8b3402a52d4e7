use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::{style, Attribute, Color, Stylize};
use crossterm::terminal::{Clear, ClearType};

use crate::command::Command;

const RULE_WIDTH: usize = 40;

/// Writes every piece of user-facing chrome. With colors off the output is
/// plain text and Markdown markers are stripped.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    colors: bool,
}

impl Renderer {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        self.paint_with(text, color, bold.then_some(Attribute::Bold))
    }

    fn paint_with(&self, text: &str, color: Color, attribute: Option<Attribute>) -> String {
        if !self.colors {
            return text.to_string();
        }
        let styled = style(text).with(color);
        match attribute {
            Some(attribute) => styled.attribute(attribute).to_string(),
            None => styled.to_string(),
        }
    }

    fn rule(&self) -> String {
        self.paint(&"─".repeat(RULE_WIDTH), Color::Blue, false)
    }

    pub fn clear_screen<W: Write>(&self, out: &mut W) -> io::Result<()> {
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))
    }

    pub fn banner<W: Write>(&self, out: &mut W, model: &str) -> io::Result<()> {
        writeln!(out, "{}", self.rule())?;
        writeln!(out, " {}", self.paint("Flux AI CLI", Color::Reset, true))?;
        writeln!(out, " Model: {model}")?;
        writeln!(out, " Commands:")?;
        for cmd in Command::ALL {
            writeln!(out, "   {:<8}{}", cmd.name(), cmd.summary())?;
        }
        writeln!(out, "   {:<8}Rewind to checkpoint", "<<#")?;
        writeln!(out, "{}", self.rule())
    }

    pub fn help<W: Write>(&self, out: &mut W, model: &str) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.paint(&format!("Model: {model}"), Color::Green, false))?;
        writeln!(out, "Available commands:")?;
        for cmd in Command::ALL {
            writeln!(out, "  {:<9}{}", cmd.name(), cmd.summary())?;
        }
        writeln!(out, "  pwd | list_dir | read_file <path>  (agent mode)")?;
        writeln!(out, "  {:<9}Rewind to checkpoint #", "<<#")?;
        writeln!(out)
    }

    pub fn reply<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.paint("AI:", Color::Blue, true))?;
        writeln!(out, "{}", self.rule())?;
        writeln!(out, "{}", self.markdown(text.trim()))?;
        writeln!(out, "{}", self.rule())
    }

    pub fn checkpoint<W: Write>(&self, out: &mut W, index: usize) -> io::Result<()> {
        writeln!(out, "{}", self.paint(&format!("[checkpoint #{index}]"), Color::DarkGrey, false))?;
        writeln!(out)
    }

    pub fn rewound<W: Write>(&self, out: &mut W, index: usize) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.paint(&format!("Rewound to checkpoint #{index}"), Color::Yellow, false))?;
        writeln!(out)
    }

    /// Light Markdown: `### ` headings, `- `/`* ` bullets, `**bold**` and `*emphasis*`.
    pub fn markdown(&self, text: &str) -> String {
        text.lines()
            .map(|line| self.markdown_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn markdown_line(&self, line: &str) -> String {
        if let Some(heading) = line.strip_prefix("### ") {
            return self.paint(heading, Color::Yellow, true);
        }
        let trimmed = line.trim_start();
        if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            return format!("{} {}", self.paint("•", Color::Green, false), self.inline_bold(item));
        }
        self.inline_bold(line)
    }

    fn inline_bold(&self, text: &str) -> String {
        let parts: Vec<&str> = text.split("**").collect();
        // an unmatched marker leaves the text untouched
        if parts.len() % 2 == 0 {
            return text.to_string();
        }
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i % 2 == 1 {
                    self.paint(part, Color::Cyan, true)
                } else {
                    self.inline_emphasis(part)
                }
            })
            .collect()
    }

    fn inline_emphasis(&self, text: &str) -> String {
        let parts: Vec<&str> = text.split('*').collect();
        if parts.len() % 2 == 0 {
            return text.to_string();
        }
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i % 2 == 1 {
                    self.paint_with(part, Color::Cyan, Some(Attribute::Dim))
                } else {
                    part.to_string()
                }
            })
            .collect()
    }
}
