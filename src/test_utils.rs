//! Test doubles shared across test modules
//!
//! In-memory stand-ins for the document store, the prompt engine and the
//! login endpoint, so the flow can be driven without a terminal or network.

use anyhow::{Result, bail};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::profiles::ConnectionProfile;
use crate::prompt::{Answers, Prompter, Question, QuestionKind};
use crate::store::DocumentStore;
use crate::validator::{AuthError, Credentials, EndpointValidator};

/// Document store kept in memory. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<HashMap<String, Value>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn with_document(key: &str, value: Value) -> Self {
        let store = Self::default();
        store.docs.lock().unwrap().insert(key.to_string(), value);
        store
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.docs.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Build a profile whose fields derive from its alias
pub fn profile(alias: &str, active: bool) -> ConnectionProfile {
    ConnectionProfile {
        alias: alias.to_string(),
        login_url: "https://login.salesforce.com".to_string(),
        username: format!("{alias}@example.com"),
        password: format!("{alias}-pass"),
        security_token: format!("{alias}-token"),
        active,
    }
}

/// Prompter that replays scripted `(question name, input)` pairs.
///
/// Inputs failing a question's validator are recorded in `rejected` and the
/// next scripted input for the same question is used, like a re-prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    inputs: VecDeque<(String, String)>,
    /// Names of every question actually asked, in order
    pub asked: Vec<String>,
    /// `(question name, validation message)` for every rejected input
    pub rejected: Vec<(String, String)>,
}

impl ScriptedPrompter {
    pub fn new(inputs: &[(&str, &str)]) -> Self {
        Self {
            inputs: inputs
                .iter()
                .map(|(name, input)| (name.to_string(), input.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }

    fn next_input(&mut self, question: &Question) -> Result<String> {
        let Some((name, input)) = self.inputs.pop_front() else {
            bail!("No scripted input left for question '{}'", question.name);
        };
        if name != question.name {
            bail!(
                "Scripted input for '{}' but question '{}' was asked",
                name,
                question.name
            );
        }
        Ok(input)
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, questions: &[Question]) -> Result<Answers> {
        let mut answers = Answers::new();
        for question in questions {
            if question.is_skipped(&answers) {
                continue;
            }
            self.asked.push(question.name.clone());

            let answer = loop {
                let mut input = self.next_input(question)?;
                if input.is_empty()
                    && let Some(default) = &question.default
                {
                    input = default.clone();
                }
                if question.kind == QuestionKind::List && !question.choices.contains(&input) {
                    bail!("'{}' is not a choice for '{}'", input, question.name);
                }
                match question.check(&input) {
                    Ok(()) => break input,
                    Err(message) => self.rejected.push((question.name.clone(), message)),
                }
            };
            answers.insert(question.name.clone(), answer);
        }
        Ok(answers)
    }
}

/// Validator replaying scripted outcomes; succeeds once the script runs out.
#[derive(Debug, Default)]
pub struct StubValidator {
    outcomes: RefCell<VecDeque<Result<(), AuthError>>>,
    /// Credentials of every validation attempt, in order
    pub calls: RefCell<Vec<Credentials>>,
}

impl StubValidator {
    pub fn new(outcomes: Vec<Result<(), AuthError>>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            calls: RefCell::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl EndpointValidator for StubValidator {
    fn validate(&self, credentials: &Credentials) -> Result<(), AuthError> {
        self.calls.borrow_mut().push(credentials.clone());
        self.outcomes.borrow_mut().pop_front().unwrap_or(Ok(()))
    }
}
