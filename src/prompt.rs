//! Question-based prompting.
//!
//! The selection flow describes what it wants to ask as a list of
//! [`Question`]s and hands them to a [`Prompter`], which asks them in order
//! and returns the collected [`Answers`]. Questions may carry a validator
//! (invalid input is re-asked in place) and a skip condition evaluated
//! against the answers collected so far.

use anyhow::{Context, Result};
use inquire::validator::Validation;
use inquire::{Password, PasswordDisplayMode, Select, Text};
use std::collections::HashMap;
use std::sync::Arc;

/// Answers keyed by question name
pub type Answers = HashMap<String, String>;

/// Field validator: `Err` carries the message shown next to the prompt
pub type InputValidator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

pub type SkipCondition = Arc<dyn Fn(&Answers) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Single choice from `choices`
    List,
    /// Free text
    Text,
    /// Masked text
    Secret,
}

#[derive(Clone)]
pub struct Question {
    pub kind: QuestionKind,
    pub name: String,
    pub message: String,
    pub default: Option<String>,
    pub choices: Vec<String>,
    pub validate: Option<InputValidator>,
    pub skip_when: Option<SkipCondition>,
}

impl Question {
    fn new(kind: QuestionKind, name: &str, message: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            message: message.to_string(),
            default: None,
            choices: Vec::new(),
            validate: None,
            skip_when: None,
        }
    }

    pub fn list(name: &str, message: &str, choices: Vec<String>) -> Self {
        Self {
            choices,
            ..Self::new(QuestionKind::List, name, message)
        }
    }

    pub fn text(name: &str, message: &str) -> Self {
        Self::new(QuestionKind::Text, name, message)
    }

    pub fn secret(name: &str, message: &str) -> Self {
        Self::new(QuestionKind::Secret, name, message)
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Skip this question when `condition` holds for the answers so far
    pub fn skip_when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Answers) -> bool + Send + Sync + 'static,
    {
        self.skip_when = Some(Arc::new(condition));
        self
    }

    pub fn is_skipped(&self, answers: &Answers) -> bool {
        self.skip_when.as_ref().is_some_and(|skip| skip(answers))
    }

    /// Run the validator, if any
    pub fn check(&self, input: &str) -> Result<(), String> {
        match &self.validate {
            Some(validate) => validate(input),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Question")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("message", &self.message)
            .field("default", &self.default)
            .field("choices", &self.choices)
            .field("validate", &self.validate.is_some())
            .field("skip_when", &self.skip_when.is_some())
            .finish()
    }
}

/// Asks a sequence of questions and collects the answers.
pub trait Prompter {
    /// Ask every non-skipped question in order.
    ///
    /// Skipped questions contribute no entry to the returned answers.
    fn ask(&mut self, questions: &[Question]) -> Result<Answers>;
}

/// Terminal prompter built on `inquire`.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl InquirePrompter {
    fn ask_one(question: &Question) -> Result<String> {
        let answer = match question.kind {
            QuestionKind::List => {
                let cursor = question
                    .default
                    .as_ref()
                    .and_then(|d| question.choices.iter().position(|c| c == d))
                    .unwrap_or(0);
                Select::new(&question.message, question.choices.clone())
                    .with_starting_cursor(cursor)
                    .prompt()
            }
            QuestionKind::Text => {
                let mut prompt = Text::new(&question.message);
                if let Some(default) = &question.default {
                    prompt = prompt.with_default(default);
                }
                if let Some(validate) = question.validate.clone() {
                    prompt = prompt.with_validator(inquire_validator(validate));
                }
                prompt.prompt()
            }
            QuestionKind::Secret => {
                let mut prompt = Password::new(&question.message)
                    .without_confirmation()
                    .with_display_mode(PasswordDisplayMode::Masked);
                if let Some(validate) = question.validate.clone() {
                    prompt = prompt.with_validator(inquire_validator(validate));
                }
                prompt.prompt()
            }
        };

        answer.with_context(|| format!("Prompt '{}' cancelled", question.name))
    }
}

impl Prompter for InquirePrompter {
    fn ask(&mut self, questions: &[Question]) -> Result<Answers> {
        let mut answers = Answers::new();
        for question in questions {
            if question.is_skipped(&answers) {
                continue;
            }
            let answer = Self::ask_one(question)?;
            answers.insert(question.name.clone(), answer);
        }
        Ok(answers)
    }
}

fn inquire_validator(
    validate: InputValidator,
) -> impl Fn(&str) -> Result<Validation, inquire::CustomUserError> + Clone + 'static {
    move |input: &str| {
        Ok(match validate(input) {
            Ok(()) => Validation::Valid,
            Err(message) => Validation::Invalid(message.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let q = Question::list("chosen_alias", "Pick one:", vec!["a".into(), "b".into()])
            .with_default("b");
        assert_eq!(q.kind, QuestionKind::List);
        assert_eq!(q.default.as_deref(), Some("b"));
        assert_eq!(q.choices.len(), 2);
        assert!(q.check("anything").is_ok());
    }

    #[test]
    fn test_validator() {
        let q = Question::text("username", "User:").with_validator(|input| {
            if input.is_empty() {
                Err("required".to_string())
            } else {
                Ok(())
            }
        });
        assert!(q.check("u").is_ok());
        assert_eq!(q.check(""), Err("required".to_string()));
    }

    #[test]
    fn test_skip_condition() {
        let q = Question::secret("password", "Password:")
            .skip_when(|answers| answers.get("mode").map(String::as_str) != Some("new"));

        let mut answers = Answers::new();
        assert!(q.is_skipped(&answers));
        answers.insert("mode".into(), "new".into());
        assert!(!q.is_skipped(&answers));
    }

    #[test]
    fn test_inquire_validator_maps_result() {
        let validate: InputValidator = Arc::new(|input| {
            if input == "ok" {
                Ok(())
            } else {
                Err("bad".to_string())
            }
        });
        let v = inquire_validator(validate);
        assert!(matches!(v("ok"), Ok(Validation::Valid)));
        assert!(matches!(v("no"), Ok(Validation::Invalid(_))));
    }

    #[test]
    fn test_debug_omits_closures() {
        let q = Question::text("alias", "Alias:").with_validator(|_| Ok(()));
        let rendered = format!("{:?}", q);
        assert!(rendered.contains("validate: true"));
        assert!(rendered.contains("skip_when: false"));
    }
}
