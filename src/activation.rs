//! Activating the selected connection.
//!
//! After a successful selection the stored collection is rewritten so that
//! the selected profile is the only active one. The whole collection is read,
//! checked, modified and written back in one step; nothing is written if the
//! request does not fit the stored data.

use anyhow::{Result, bail};
use tracing::info;

use crate::profiles::{ConnectionProfile, ProfileStore, SelectionRequest};
use crate::store::DocumentStore;

pub struct ActivationWriter<'a, S> {
    profiles: &'a ProfileStore<S>,
}

impl<'a, S: DocumentStore> ActivationWriter<'a, S> {
    pub fn new(profiles: &'a ProfileStore<S>) -> Self {
        Self { profiles }
    }

    /// Mark the requested profile as the only active one and persist.
    ///
    /// `CreateNew` appends the new profile; `UseExisting` requires the alias
    /// to be stored already.
    pub fn activate(&self, request: &SelectionRequest) -> Result<()> {
        let mut connections = self.profiles.load()?;

        match request {
            SelectionRequest::UseExisting { alias } => {
                let Some(index) = connections.iter().position(|c| c.alias == *alias) else {
                    bail!("Cannot activate '{}': no saved connection has that alias", alias);
                };
                deactivate_all(&mut connections);
                connections[index].active = true;
            }
            SelectionRequest::CreateNew {
                alias,
                login_url,
                username,
                password,
                security_token,
            } => {
                if connections.iter().any(|c| c.alias == *alias) {
                    bail!("Cannot save '{}': a connection with that alias already exists", alias);
                }
                deactivate_all(&mut connections);
                connections.push(ConnectionProfile {
                    alias: alias.clone(),
                    login_url: login_url.clone(),
                    username: username.clone(),
                    password: password.clone(),
                    security_token: security_token.clone(),
                    active: true,
                });
            }
        }

        self.profiles.save(&connections)?;
        info!(alias = request.alias(), total = connections.len(), "connection activated");
        Ok(())
    }
}

fn deactivate_all(connections: &mut [ConnectionProfile]) {
    for connection in connections {
        connection.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, profile};

    fn active_aliases(profiles: &ProfileStore<MemoryStore>) -> Vec<String> {
        profiles
            .load()
            .unwrap()
            .into_iter()
            .filter(|p| p.active)
            .map(|p| p.alias)
            .collect()
    }

    fn use_existing(alias: &str) -> SelectionRequest {
        SelectionRequest::UseExisting {
            alias: alias.to_string(),
        }
    }

    fn create_new(alias: &str) -> SelectionRequest {
        SelectionRequest::CreateNew {
            alias: alias.to_string(),
            login_url: "https://login.salesforce.com".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            security_token: "t".to_string(),
        }
    }

    #[test]
    fn test_create_new_on_empty_store() {
        let profiles = ProfileStore::new(MemoryStore::default());

        ActivationWriter::new(&profiles)
            .activate(&create_new("prod"))
            .unwrap();

        assert_eq!(
            profiles.load().unwrap(),
            vec![ConnectionProfile {
                alias: "prod".to_string(),
                login_url: "https://login.salesforce.com".to_string(),
                username: "u".to_string(),
                password: "p".to_string(),
                security_token: "t".to_string(),
                active: true,
            }]
        );
    }

    #[test]
    fn test_use_existing_moves_active_flag() {
        let profiles = ProfileStore::new(MemoryStore::default());
        let prod = profile("prod", true);
        let dev = profile("dev", false);
        profiles.save(&[prod.clone(), dev.clone()]).unwrap();

        ActivationWriter::new(&profiles)
            .activate(&use_existing("dev"))
            .unwrap();

        assert_eq!(
            profiles.load().unwrap(),
            vec![
                ConnectionProfile {
                    active: false,
                    ..prod
                },
                ConnectionProfile { active: true, ..dev },
            ]
        );
    }

    #[test]
    fn test_create_new_deactivates_others_and_appends() {
        let profiles = ProfileStore::new(MemoryStore::default());
        profiles
            .save(&[profile("prod", true), profile("dev", false)])
            .unwrap();

        ActivationWriter::new(&profiles)
            .activate(&create_new("qa"))
            .unwrap();

        let aliases: Vec<_> = profiles.load().unwrap().into_iter().map(|p| p.alias).collect();
        assert_eq!(aliases, vec!["prod", "dev", "qa"]);
        assert_eq!(active_aliases(&profiles), vec!["qa"]);
    }

    #[test]
    fn test_exactly_one_active_after_any_activation() {
        let profiles = ProfileStore::new(MemoryStore::default());
        // Stored data with several active flags set still converges to one
        profiles
            .save(&[profile("a", true), profile("b", true), profile("c", false)])
            .unwrap();
        let writer = ActivationWriter::new(&profiles);

        for request in [use_existing("c"), create_new("d"), use_existing("a")] {
            writer.activate(&request).unwrap();
            assert_eq!(active_aliases(&profiles), vec![request.alias().to_string()]);
        }
    }

    #[test]
    fn test_use_existing_is_idempotent() {
        let store = MemoryStore::default();
        let profiles = ProfileStore::new(store.clone());
        profiles
            .save(&[profile("prod", true), profile("dev", false)])
            .unwrap();
        let writer = ActivationWriter::new(&profiles);

        writer.activate(&use_existing("dev")).unwrap();
        let first = profiles.load().unwrap();
        writer.activate(&use_existing("dev")).unwrap();

        assert_eq!(profiles.load().unwrap(), first);
    }

    #[test]
    fn test_unknown_alias_writes_nothing() {
        let store = MemoryStore::default();
        let profiles = ProfileStore::new(store.clone());
        profiles.save(&[profile("prod", true)]).unwrap();
        let saves_before = store.save_count();

        let err = ActivationWriter::new(&profiles)
            .activate(&use_existing("ghost"))
            .unwrap_err();

        assert!(err.to_string().contains("ghost"));
        assert_eq!(store.save_count(), saves_before);
        assert_eq!(active_aliases(&profiles), vec!["prod"]);
    }

    #[test]
    fn test_duplicate_new_alias_writes_nothing() {
        let store = MemoryStore::default();
        let profiles = ProfileStore::new(store.clone());
        profiles.save(&[profile("prod", true)]).unwrap();
        let saves_before = store.save_count();

        assert!(
            ActivationWriter::new(&profiles)
                .activate(&create_new("prod"))
                .is_err()
        );
        assert_eq!(store.save_count(), saves_before);
    }
}
