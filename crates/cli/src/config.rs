// Runner configuration (flags with environment fallbacks)

use clap::Args;
use std::path::PathBuf;

use exchanger_core::domain::{ArtifactLocator, Environment};

const DEFAULT_ENV: &str = "local";
const DEFAULT_STORAGE_ROOT: &str = "~/.exchanger/storage";
const DEFAULT_PUBLIC_BASE: &str = "http://localhost";
const DEFAULT_DB_PATH: &str = "~/.exchanger/journal.db";
const DEFAULT_FEEDS_SOURCE: &str = "feeds.json";
const DEFAULT_LOG_FORMAT: &str = "pretty";

#[derive(Args, Debug, Clone)]
pub struct RunnerConfig {
    /// Deployment environment (`production` selects the production artifact directory)
    #[arg(long = "env", env = "EXCHANGER_ENV", default_value = DEFAULT_ENV)]
    pub environment: String,

    /// Root directory artifacts are written under
    #[arg(long, env = "EXCHANGER_STORAGE_ROOT", default_value = DEFAULT_STORAGE_ROOT)]
    pub storage_root: String,

    /// Base URL the storage root is published under
    #[arg(long, env = "EXCHANGER_PUBLIC_BASE", default_value = DEFAULT_PUBLIC_BASE)]
    pub public_base: String,

    /// SQLite journal path
    #[arg(long, env = "EXCHANGER_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    /// Import endpoint artifacts are announced to
    #[arg(long, env = "EXCHANGER_DELIVERY_URL")]
    pub delivery_url: Option<String>,

    #[arg(long, env = "EXCHANGER_DELIVERY_TOKEN", hide_env_values = true)]
    pub delivery_token: Option<String>,

    /// JSON file holding the feed articles
    #[arg(long, env = "EXCHANGER_FEEDS_SOURCE", default_value = DEFAULT_FEEDS_SOURCE)]
    pub feeds_source: String,

    /// `json` or `pretty`
    #[arg(long, env = "EXCHANGER_LOG_FORMAT", default_value = DEFAULT_LOG_FORMAT)]
    pub log_format: String,
}

impl RunnerConfig {
    pub fn environment(&self) -> Environment {
        match self.environment.parse() {
            Ok(env) => env,
            Err(never) => match never {},
        }
    }

    pub fn storage_root(&self) -> PathBuf {
        expand(&self.storage_root)
    }

    pub fn db_path(&self) -> PathBuf {
        expand(&self.db_path)
    }

    pub fn feeds_source(&self) -> PathBuf {
        expand(&self.feeds_source)
    }

    pub fn locator(&self) -> ArtifactLocator {
        ArtifactLocator::new(self.environment(), self.public_base.clone())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: RunnerConfig,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "exchanger",
            "--env",
            "production",
            "--storage-root",
            "/srv/storage",
            "--public-base",
            "https://cdn.example.com/",
            "--feeds-source",
            "/tmp/feeds.json",
        ]);

        assert_eq!(cli.config.environment(), Environment::Production);
        assert_eq!(cli.config.storage_root(), PathBuf::from("/srv/storage"));
        assert_eq!(cli.config.feeds_source(), PathBuf::from("/tmp/feeds.json"));
        assert_eq!(
            cli.config.locator().url_for("exchanger/feeds.csv"),
            "https://cdn.example.com/storage/exchanger/feeds.csv"
        );
    }

    #[test]
    fn test_tilde_is_expanded() {
        let path = expand("~/.exchanger/journal.db");
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".exchanger/journal.db"));
    }
}
