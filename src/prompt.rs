//! Interactive prompt gateway
//!
//! All interactive questions go through the [`PromptGateway`] trait so the
//! deployment logic can be exercised in tests with scripted answers. The real
//! implementation is backed by `dialoguer`.

use dialoguer::{Confirm, Input, Password};

use crate::error::DeployResult;

/// Structured answers for confirmations and field entry.
pub trait PromptGateway {
    /// Yes/no question with a default.
    fn confirm(&mut self, message: &str, default: bool) -> DeployResult<bool>;

    /// Free-text input, optionally pre-filled with a default.
    fn input(&mut self, message: &str, default: Option<&str>) -> DeployResult<String>;

    /// Masked secret input. The entered value must never be echoed.
    fn password(&mut self, message: &str) -> DeployResult<String>;

    /// Numeric port input with a default.
    fn port(&mut self, message: &str, default: u16) -> DeployResult<u16>;
}

/// Terminal prompts via dialoguer.
pub struct TermPrompt;

impl PromptGateway for TermPrompt {
    fn confirm(&mut self, message: &str, default: bool) -> DeployResult<bool> {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?)
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> DeployResult<String> {
        let mut input = Input::<String>::new().with_prompt(message).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn password(&mut self, message: &str) -> DeployResult<String> {
        Ok(Password::new().with_prompt(message).interact()?)
    }

    fn port(&mut self, message: &str, default: u16) -> DeployResult<u16> {
        Ok(Input::<u16>::new()
            .with_prompt(message)
            .default(default)
            .interact_text()?)
    }
}

/// Scripted prompt gateway for tests.
///
/// Replays queued answers in order and panics on a mismatched question kind,
/// so a test fails loudly when the flow under test asks something unexpected.
#[cfg(test)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<Answer>,
    pub asked: Vec<String>,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub enum Answer {
    Confirm(bool),
    Input(String),
    Password(String),
    Port(u16),
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, message: &str) -> Answer {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {message}"))
    }
}

#[cfg(test)]
impl PromptGateway for ScriptedPrompt {
    fn confirm(&mut self, message: &str, _default: bool) -> DeployResult<bool> {
        match self.next(message) {
            Answer::Confirm(value) => Ok(value),
            other => panic!("expected Confirm answer for '{message}', got {other:?}"),
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> DeployResult<String> {
        match self.next(message) {
            Answer::Input(value) if value.is_empty() => {
                Ok(default.unwrap_or_default().to_string())
            }
            Answer::Input(value) => Ok(value),
            other => panic!("expected Input answer for '{message}', got {other:?}"),
        }
    }

    fn password(&mut self, message: &str) -> DeployResult<String> {
        match self.next(message) {
            Answer::Password(value) => Ok(value),
            other => panic!("expected Password answer for '{message}', got {other:?}"),
        }
    }

    fn port(&mut self, message: &str, _default: u16) -> DeployResult<u16> {
        match self.next(message) {
            Answer::Port(value) => Ok(value),
            other => panic!("expected Port answer for '{message}', got {other:?}"),
        }
    }
}
