// Artifact path convention

use std::str::FromStr;

/// Directory holding artifacts in production
pub const PRODUCTION_DIRECTORY: &str = "exchanger";

/// Directory holding artifacts everywhere else
pub const TEST_DIRECTORY: &str = "exchanger/test";

/// Extension of snapshot artifacts
pub const ARTIFACT_EXTENSION: &str = "csv";

/// Public prefix under which stored files are served
pub const PUBLIC_STORAGE_PREFIX: &str = "storage";

/// Deployment environment the runner executes in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    NonProduction(String),
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Artifact directory for this environment
    pub fn directory(&self) -> &'static str {
        if self.is_production() {
            PRODUCTION_DIRECTORY
        } else {
            TEST_DIRECTORY
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "production" {
            Ok(Environment::Production)
        } else {
            Ok(Environment::NonProduction(name))
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::NonProduction(name) => f.write_str(name),
        }
    }
}

/// Derives artifact paths and public URLs for a job table.
///
/// Only computes locations; existence checks go through an
/// [`ArtifactStore`](crate::port::ArtifactStore).
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    environment: Environment,
    public_base: String,
}

impl ArtifactLocator {
    pub fn new(environment: Environment, public_base: impl Into<String>) -> Self {
        Self {
            environment,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// `<env-dir>/<table>.csv`, relative to the storage root
    pub fn relative_path(&self, table: &str) -> String {
        format!(
            "{}/{}.{}",
            self.environment.directory(),
            table,
            ARTIFACT_EXTENSION
        )
    }

    /// Public URL for a relative storage path (no existence check)
    pub fn url_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base, PUBLIC_STORAGE_PREFIX, relative_path
        )
    }
}
