// Job registry: maps command names to their definition and phase strategy

pub mod feeds;

use std::sync::Arc;

use exchanger_core::domain::JobDefinition;
use exchanger_core::port::{ArtifactStore, Delivery, PhaseStrategy};
use exchanger_core::{AppError, Result};

use crate::config::RunnerConfig;

/// Adapters shared by every job
pub struct JobDeps {
    pub store: Arc<dyn ArtifactStore>,
    pub delivery: Arc<dyn Delivery>,
}

/// Known job names (the `exchanger:` prefix is optional on the command line)
pub const JOBS: &[&str] = &[feeds::NAME];

/// Resolve `name` to a runnable job.
///
/// Unknown names and invalid job identities are configuration errors.
pub fn build(
    name: &str,
    config: &RunnerConfig,
    deps: JobDeps,
) -> Result<(JobDefinition, Box<dyn PhaseStrategy>)> {
    let short = name.trim().strip_prefix("exchanger:").unwrap_or(name.trim());

    match short {
        "feeds" => {
            let definition = feeds::definition()?;
            let strategy = feeds::FeedsJob::new(
                config.feeds_source(),
                config.locator(),
                deps.store,
                deps.delivery,
            );
            Ok((definition, Box::new(strategy)))
        }
        _ => Err(AppError::Config(format!(
            "Unknown job '{}' (known jobs: {})",
            name,
            JOBS.join(", ")
        ))),
    }
}
