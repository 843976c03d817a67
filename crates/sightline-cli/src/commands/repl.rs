//! Shared rustyline front end for both chat clients.

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use sightline_core::{ChatMessage, Sender};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type ReplEditor = Editor<CliHelper, DefaultHistory>;

/// A slash command offered by one of the clients.
#[derive(Debug, Clone, Copy)]
pub struct SlashCommand {
    pub name: &'static str,
    pub summary: &'static str,
}

/// Completes slash commands, hints their summary, and flags unknown ones.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<SlashCommand>,
}

impl CliHelper {
    fn find(&self, name: &str) -> Option<&SlashCommand> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        if !typed.starts_with('/') || typed.contains(' ') {
            return Ok((pos, vec![]));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.name.starts_with(typed))
            .map(|cmd| Pair {
                display: format!("{:<10} {}", cmd.name, cmd.summary),
                replacement: cmd.name.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        if self.find(line.trim_end()).is_some() {
            Owned(line.bright_cyan().to_string())
        } else if self.commands.iter().any(|cmd| cmd.name.starts_with(line)) {
            Owned(line.cyan().to_string())
        } else {
            Owned(line.red().to_string())
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    /// Finishes a unique command prefix, or shows the summary of a complete
    /// command.
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        if let Some(cmd) = self.find(line) {
            return Some(format!("  {}", cmd.summary));
        }

        let mut matches = self.commands.iter().filter(|cmd| cmd.name.starts_with(line));
        match (matches.next(), matches.next()) {
            (Some(cmd), None) => Some(cmd.name[line.len()..].to_string()),
            _ => None,
        }
    }
}

impl Validator for CliHelper {}

/// One line read from the prompt.
pub enum ReplInput {
    Message(String),
    Command(String),
    Empty,
    Quit,
}

pub fn editor(commands: &[SlashCommand]) -> Result<ReplEditor> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper {
        commands: commands.to_vec(),
    }));
    Ok(rl)
}

pub fn banner(title: &str, hint: &str) {
    println!("{}", format!("=== {title} ===").bright_magenta().bold());
    println!("{}", hint.bright_black());
    println!();
}

/// Blocks on the prompt until the user enters a line or leaves.
pub fn read_input(rl: &mut ReplEditor) -> ReplInput {
    match rl.readline(">> ") {
        Ok(line) => {
            let trimmed = line.trim();

            if trimmed == "quit" || trimmed == "exit" {
                println!("{}", "Goodbye!".bright_green());
                return ReplInput::Quit;
            }

            if trimmed.is_empty() {
                return ReplInput::Empty;
            }

            let _ = rl.add_history_entry(&line);

            if trimmed.starts_with('/') {
                ReplInput::Command(trimmed.to_string())
            } else {
                ReplInput::Message(trimmed.to_string())
            }
        }
        Err(ReadlineError::Interrupted) => {
            println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            ReplInput::Empty
        }
        Err(ReadlineError::Eof) => {
            println!("{}", "CTRL-D detected. Exiting...".bright_green());
            ReplInput::Quit
        }
        Err(err) => {
            eprintln!("{}", format!("Error: {:?}", err).red());
            ReplInput::Quit
        }
    }
}

/// Renders chat log entries as they are appended.
pub fn spawn_printer(mut entries: mpsc::UnboundedReceiver<ChatMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = entries.recv().await {
            print_entry(&message);
        }
    })
}

fn print_entry(message: &ChatMessage) {
    match message.sender {
        Sender::User => println!("{}", format!("> {}", message.text).green()),
        Sender::Assistant | Sender::Bot => {
            for line in message.display_text().lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
        Sender::Error => println!("{}", message.text.red()),
    }
}

pub fn notice(text: &str) {
    println!("{}", text.yellow());
}

pub fn status(text: &str) {
    println!("{}", text.bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> CliHelper {
        CliHelper {
            commands: vec![
                SlashCommand {
                    name: "/status",
                    summary: "show status",
                },
                SlashCommand {
                    name: "/open",
                    summary: "open panel",
                },
                SlashCommand {
                    name: "/close",
                    summary: "close panel",
                },
            ],
        }
    }

    #[test]
    fn test_hint_finishes_unique_prefix_and_describes_full_command() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let helper = helper();

        assert_eq!(helper.hint("/st", 3, &ctx), Some("atus".to_string()));
        assert_eq!(helper.hint("/open", 5, &ctx), Some("  open panel".to_string()));
        assert_eq!(helper.hint("hello", 5, &ctx), None);
    }

    #[test]
    fn test_completion_lists_matching_commands() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, candidates) = helper().complete("/c", 2, &ctx).unwrap();
        assert_eq!(start, 0);
        let names: Vec<&str> = candidates.iter().map(|c| c.replacement.as_str()).collect();
        assert_eq!(names, vec!["/close"]);
    }
}
