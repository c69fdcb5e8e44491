//! Operator prompts.

use std::io::{self, BufRead, Write};

use fwg_core::{FwgError, Prompter, Result};

/// Interprets a yes/no answer. Empty input picks `default`; anything
/// unrecognised yields `None`.
#[must_use]
pub fn parse_confirm(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks on stderr and reads answers from stdin.
///
/// End of input counts as an empty answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Creates the prompter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn ask(&self, question: &str) -> Result<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{question} ")
            .and_then(|()| stderr.flush())
            .map_err(|e| FwgError::io("<stderr>", e))?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| FwgError::io("<stdin>", e))?;
        Ok(line.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{prompt} {hint}"))?;
            if let Some(choice) = parse_confirm(&answer, default) {
                return Ok(choice);
            }
        }
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        let question = if default.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt} [{default}]")
        };
        let answer = self.ask(&question)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

/// Non-interactive mode: confirms everything and takes every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool> {
        Ok(true)
    }

    fn input(&self, _prompt: &str, default: &str) -> Result<String> {
        Ok(default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", true, Some(true) ; "empty takes default yes")]
    #[test_case("", false, Some(false) ; "empty takes default no")]
    #[test_case("Y", false, Some(true) ; "upper y")]
    #[test_case(" yes ", false, Some(true) ; "padded yes")]
    #[test_case("no", true, Some(false) ; "no")]
    #[test_case("maybe", true, None ; "unrecognised")]
    fn confirm_answers(answer: &str, default: bool, expected: Option<bool>) {
        assert_eq!(parse_confirm(answer, default), expected);
    }

    #[test]
    fn assume_yes() {
        assert!(AssumeYes.confirm("delete?", false).expect("confirm"));
        assert_eq!(AssumeYes.input("key", "").expect("input"), "");
    }
}
