//! Interactive prompts.
//!
//! Small stdin/stderr implementation behind a trait so commands can be
//! driven by a scripted prompter in tests.

use std::io::{self, BufRead, Write};

pub trait Prompter {
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool>;
    fn select(&self, message: &str, options: &[String]) -> io::Result<usize>;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            eprint!("{message} ({hint}) ");
            io::stderr().flush()?;

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Ok(default);
            }

            match line.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("please answer y or n"),
            }
        }
    }

    fn select(&self, message: &str, options: &[String]) -> io::Result<usize> {
        eprintln!("{message}");
        for (i, option) in options.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, option);
        }

        loop {
            eprint!("Enter a number (1-{}): ", options.len());
            io::stderr().flush()?;

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no selection made",
                ));
            }

            if let Ok(choice) = line.trim().parse::<usize>() {
                if choice >= 1 && choice <= options.len() {
                    return Ok(choice - 1);
                }
            }
            eprintln!("please enter a number between 1 and {}", options.len());
        }
    }
}

/// Scripted prompter for tests.
pub struct StaticPrompter {
    pub confirm_answer: bool,
    pub selection: usize,
}

impl Prompter for StaticPrompter {
    fn confirm(&self, _message: &str, _default: bool) -> io::Result<bool> {
        Ok(self.confirm_answer)
    }

    fn select(&self, _message: &str, options: &[String]) -> io::Result<usize> {
        Ok(self.selection.min(options.len().saturating_sub(1)))
    }
}
