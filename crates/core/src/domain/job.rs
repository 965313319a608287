// Job Definition - identity of a concrete exchanger job

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Static identity of a job, validated once at construction.
///
/// A job without a name, a record table or an import type cannot run:
/// construction fails before any phase is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Command signature, e.g. `exchanger:feeds`
    name: String,
    /// Underlying record-table name; doubles as the artifact identity
    table: String,
    /// Import kind announced to the delivery endpoint, e.g. `table`
    import_type: String,
    description: String,
}

impl JobDefinition {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        import_type: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let table = table.into();
        let import_type = import_type.into();

        if name.trim().is_empty() {
            return Err(DomainError::MissingField("job name"));
        }
        if table.trim().is_empty() {
            return Err(DomainError::MissingField("model"));
        }
        if import_type.trim().is_empty() {
            return Err(DomainError::MissingField("import type"));
        }
        if table.contains(['/', '\\']) || table.contains("..") {
            return Err(DomainError::ValidationError(format!(
                "table name '{}' must not contain path separators",
                table
            )));
        }

        Ok(Self {
            name,
            table,
            import_type,
            description: String::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn import_type(&self) -> &str {
        &self.import_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
