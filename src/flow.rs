//! Connection selection.
//!
//! Resolves which credential set to use for this run:
//! - A `-c <alias>` naming a stored connection skips all prompting.
//! - Otherwise the user picks a stored alias or `Create New` and, for the
//!   latter, enters the new connection's fields.
//! - The candidate is validated with a live login. On failure the error is
//!   shown and selection starts over with nothing carried forward.

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::profiles::{
    CREATE_NEW, DEFAULT_LOGIN_URL, ProfileStore, SelectionRequest, validate_login_url,
    validate_required,
};
use crate::prompt::{Answers, Prompter, Question};
use crate::store::DocumentStore;
use crate::ui::Ui;
use crate::validator::{Credentials, EndpointValidator};

const CHOSEN_ALIAS: &str = "chosen_alias";
const ALIAS: &str = "alias";
const LOGIN_URL: &str = "loginUrl";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const SECURITY_TOKEN: &str = "securityToken";

#[derive(Debug, Error)]
pub enum FlowError {
    /// `-c` named a connection that is not stored
    #[error(
        "No saved connection named '{alias}'.\nHint: Run without -c to choose or create a connection."
    )]
    UnknownConnection { alias: String },
}

/// A resolved selection together with the credentials to validate it with
struct Candidate {
    request: SelectionRequest,
    credentials: Credentials,
}

pub struct SelectionFlow<'a, S, P, V> {
    profiles: &'a ProfileStore<S>,
    prompter: &'a mut P,
    validator: &'a V,
    ui: &'a Ui,
}

impl<'a, S, P, V> SelectionFlow<'a, S, P, V>
where
    S: DocumentStore + Clone + Send + Sync + 'static,
    P: Prompter,
    V: EndpointValidator,
{
    pub fn new(
        profiles: &'a ProfileStore<S>,
        prompter: &'a mut P,
        validator: &'a V,
        ui: &'a Ui,
    ) -> Self {
        Self {
            profiles,
            prompter,
            validator,
            ui,
        }
    }

    /// Run selection until a candidate validates.
    ///
    /// `requested` is the alias given on the command line. It is only honored
    /// on the first attempt; after a failed login the user is prompted.
    pub fn run(&mut self, requested: Option<&str>) -> Result<SelectionRequest> {
        let mut requested = requested.filter(|alias| !alias.is_empty());

        loop {
            let candidate = match requested.take() {
                Some(alias) => match self.resolve_requested(alias)? {
                    Some(candidate) => Some(candidate),
                    None => self.prompt_selection()?,
                },
                None => self.prompt_selection()?,
            };
            let Some(candidate) = candidate else {
                continue;
            };

            if self.try_login(&candidate.credentials) {
                info!(alias = candidate.request.alias(), "connection validated");
                return Ok(candidate.request);
            }
        }
    }

    /// Non-interactive path for a command-line alias.
    ///
    /// Returns `None` for the `Create New` sentinel, which always prompts.
    fn resolve_requested(&self, alias: &str) -> Result<Option<Candidate>> {
        if alias == CREATE_NEW {
            debug!("sentinel given as connection alias, prompting");
            return Ok(None);
        }

        let Some(profile) = self.profiles.find(alias)? else {
            return Err(FlowError::UnknownConnection {
                alias: alias.to_string(),
            }
            .into());
        };

        debug!(alias, "using connection from command line");
        Ok(Some(Candidate {
            credentials: Credentials::from(&profile),
            request: SelectionRequest::UseExisting {
                alias: profile.alias,
            },
        }))
    }

    /// Ask which connection to use, collecting a new one if requested.
    ///
    /// Returns `None` if the chosen connection vanished from the store while
    /// the prompt was open.
    fn prompt_selection(&mut self) -> Result<Option<Candidate>> {
        let questions = self.questions()?;
        let mut answers = self.prompter.ask(&questions)?;

        let chosen = take(&mut answers, CHOSEN_ALIAS);
        if chosen == CREATE_NEW {
            let credentials = Credentials {
                login_url: take(&mut answers, LOGIN_URL),
                username: take(&mut answers, USERNAME),
                password: take(&mut answers, PASSWORD),
                security_token: take(&mut answers, SECURITY_TOKEN),
            };
            let request = SelectionRequest::CreateNew {
                alias: take(&mut answers, ALIAS),
                login_url: credentials.login_url.clone(),
                username: credentials.username.clone(),
                password: credentials.password.clone(),
                security_token: credentials.security_token.clone(),
            };
            return Ok(Some(Candidate {
                request,
                credentials,
            }));
        }

        match self.profiles.find(&chosen)? {
            Some(profile) => Ok(Some(Candidate {
                credentials: Credentials::from(&profile),
                request: SelectionRequest::UseExisting { alias: chosen },
            })),
            None => {
                self.ui
                    .warn(format!("Connection '{}' no longer exists", chosen));
                Ok(None)
            }
        }
    }

    fn questions(&self) -> Result<Vec<Question>> {
        let not_new = |answers: &Answers| {
            answers.get(CHOSEN_ALIAS).map(String::as_str) != Some(CREATE_NEW)
        };
        let profiles = self.profiles.clone();

        Ok(vec![
            Question::list(
                CHOSEN_ALIAS,
                "Choose which connection to use:",
                self.profiles.aliases()?,
            )
            .with_default(CREATE_NEW),
            Question::text(ALIAS, "Enter a unique alias for this connection:")
                .with_validator(move |input| profiles.validate_new_alias(input))
                .skip_when(not_new),
            Question::text(LOGIN_URL, "Enter the login URL:")
                .with_default(DEFAULT_LOGIN_URL)
                .with_validator(validate_login_url)
                .skip_when(not_new),
            Question::text(USERNAME, "Enter your username:")
                .with_validator(|input| validate_required(input, "Username"))
                .skip_when(not_new),
            Question::secret(PASSWORD, "Enter your password:")
                .with_validator(|input| validate_required(input, "Password"))
                .skip_when(not_new),
            Question::text(SECURITY_TOKEN, "Enter your security token:").skip_when(not_new),
        ])
    }

    /// Attempt a login, reporting a failure to the user.
    fn try_login(&self, credentials: &Credentials) -> bool {
        let spinner = self.ui.spinner(format!(
            "Logging in to {} as {}...",
            credentials.login_url, credentials.username
        ));

        match self.validator.validate(credentials) {
            Ok(()) => {
                self.ui.spinner_finish_ok(
                    &spinner,
                    format!("Logged in as {}", credentials.username),
                );
                true
            }
            Err(e) => {
                warn!(username = %credentials.username, "login failed");
                self.ui.spinner_finish_err(&spinner, e.message);
                false
            }
        }
    }
}

fn take(answers: &mut Answers, name: &str) -> String {
    answers.remove(name).unwrap_or_default()
}
