use std::path::PathBuf;

use crate::profiles::CONNECTIONS_KEY;

/// Store directory used when none is configured, relative to the working
/// directory
pub const DEFAULT_STORE_DIR: &str = ".jsforce";

/// All computed paths used by sfconn
#[derive(Debug, Clone)]
pub struct Paths {
    /// ./.jsforce
    pub store_dir: PathBuf,
    /// ./.jsforce/connections.json
    pub connections_file: PathBuf,
}

impl Paths {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        let store_dir = store_dir.into();
        let connections_file = store_dir.join(format!("{CONNECTIONS_KEY}.json"));

        Self {
            store_dir,
            connections_file,
        }
    }

    /// Check whether any connection has been saved yet
    pub fn has_connections(&self) -> bool {
        self.connections_file.exists()
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        let paths = Paths::default();
        assert_eq!(paths.store_dir, PathBuf::from(".jsforce"));
        assert!(paths.connections_file.ends_with(".jsforce/connections.json"));
    }

    #[test]
    fn test_has_connections() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::new(temp_dir.path().join("store"));
        assert!(!paths.has_connections());

        std::fs::create_dir_all(&paths.store_dir).unwrap();
        std::fs::write(&paths.connections_file, "[]").unwrap();
        assert!(paths.has_connections());
    }
}
