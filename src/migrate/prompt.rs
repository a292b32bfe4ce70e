//! Operator confirmation.

use std::io::{self, BufRead, Write};

pub trait Prompt {
    /// Ask a yes/no question; anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Reads the answer from a line-oriented reader (stdin in the binary).
///
/// Accepts `y`/`yes` and `n`/`no` (any case). Empty input and EOF decline;
/// anything else asks again.
pub struct StdinPrompt<R, W> {
    input: R,
    output: W,
}

impl StdinPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for StdinPrompt<R, W> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let mut line = String::new();
        loop {
            line.clear();
            write!(self.output, "{question} (y/N): ")?;
            self.output.flush()?;

            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }
}

/// Batch mode: every question is answered yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }
}
