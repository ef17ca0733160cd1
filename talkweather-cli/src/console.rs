use anyhow::{Context, Result};
use inquire::{InquireError, Text};
use std::io::{self, BufRead, IsTerminal, Write};

/// Line-based prompts and output.
pub trait Console {
    /// Show `prompt` and read one answer. `Ok(None)` when the user cancels or input is closed.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;

    fn print(&mut self, line: &str);
}

/// Pick the interactive console on a terminal, plain line reads otherwise (pipes, redirects).
pub fn stdio_console() -> Box<dyn Console> {
    if io::stdin().is_terminal() {
        Box::new(InquireConsole)
    } else {
        Box::new(LineConsole)
    }
}

#[derive(Debug, Default)]
pub struct InquireConsole;

impl Console for InquireConsole {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        match Text::new(prompt).prompt() {
            Ok(answer) => Ok(Some(answer)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(err).context("Failed to read answer from the terminal"),
        }
    }

    fn print(&mut self, line: &str) {
        println!("{line}");
    }
}

#[derive(Debug, Default)]
pub struct LineConsole;

impl Console for LineConsole {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read answer from stdin")?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn print(&mut self, line: &str) {
        println!("{line}");
    }
}
