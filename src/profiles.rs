//! Connection profile data model.
//!
//! This module owns the `"connections"` document:
//! - The `ConnectionProfile` record as it is serialized on disk
//! - Loading, saving and querying the ordered profile collection
//! - Field validation rules shared by the prompts and the activation step

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::DocumentStore;

/// Key of the document holding every saved connection
pub const CONNECTIONS_KEY: &str = "connections";

/// Reserved selection entry meaning "collect a new connection".
///
/// Never a valid alias for a stored profile.
pub const CREATE_NEW: &str = "Create New";

/// Every login URL must use this scheme
pub const SECURE_SCHEME: &str = "https://";

/// Suggested login URL for new connections (sandbox login)
pub const DEFAULT_LOGIN_URL: &str = "https://test.salesforce.com";

/// One saved credential set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    #[serde(default)]
    pub alias: String,
    pub login_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub security_token: String,
    #[serde(default)]
    pub active: bool,
}

/// What the selection flow resolved for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRequest {
    /// Activate a profile that is already stored
    UseExisting { alias: String },
    /// Store and activate a freshly entered profile
    CreateNew {
        alias: String,
        login_url: String,
        username: String,
        password: String,
        security_token: String,
    },
}

impl SelectionRequest {
    pub fn alias(&self) -> &str {
        match self {
            Self::UseExisting { alias } | Self::CreateNew { alias, .. } => alias,
        }
    }
}

/// Ordered collection of connection profiles on top of a document store.
#[derive(Debug, Clone)]
pub struct ProfileStore<S> {
    store: S,
}

impl<S: DocumentStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load every stored profile in insertion order.
    ///
    /// A missing document is initialized to an empty list.
    pub fn load(&self) -> Result<Vec<ConnectionProfile>> {
        match self.store.get(CONNECTIONS_KEY)? {
            Some(value) => serde_json::from_value(value)
                .with_context(|| format!("Malformed '{}' document", CONNECTIONS_KEY)),
            None => {
                debug!("no saved connections yet, initializing empty list");
                self.save(&[])?;
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the whole stored collection
    pub fn save(&self, profiles: &[ConnectionProfile]) -> Result<()> {
        let value = serde_json::to_value(profiles).context("Failed to serialize connections")?;
        self.store.save(CONNECTIONS_KEY, &value)
    }

    /// Selection list: the `CREATE_NEW` sentinel followed by every non-empty
    /// alias in stored order.
    pub fn aliases(&self) -> Result<Vec<String>> {
        let mut aliases = vec![CREATE_NEW.to_string()];
        aliases.extend(
            self.load()?
                .into_iter()
                .map(|p| p.alias)
                .filter(|alias| !alias.is_empty()),
        );
        Ok(aliases)
    }

    /// Find a profile by exact alias
    pub fn find(&self, alias: &str) -> Result<Option<ConnectionProfile>> {
        Ok(self.load()?.into_iter().find(|p| p.alias == alias))
    }

    /// The profile currently marked active, if any
    pub fn active(&self) -> Result<Option<ConnectionProfile>> {
        Ok(self.load()?.into_iter().find(|p| p.active))
    }

    /// Check a proposed alias for a new profile against the live store.
    pub fn validate_new_alias(&self, input: &str) -> Result<(), String> {
        validate_required(input, "Alias")?;

        let aliases = self
            .aliases()
            .map_err(|e| format!("Could not read saved connections: {e:#}"))?;
        if aliases.iter().any(|a| a == input) {
            return Err(format!("A connection named '{}' already exists", input));
        }
        Ok(())
    }
}

/// Reject empty input for a required field
pub fn validate_required(input: &str, field: &str) -> Result<(), String> {
    if input.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(())
}

pub fn validate_login_url(input: &str) -> Result<(), String> {
    validate_required(input, "Login URL")?;
    if !input.starts_with(SECURE_SCHEME) {
        return Err(format!("Login URL must start with {}", SECURE_SCHEME));
    }
    Ok(())
}
