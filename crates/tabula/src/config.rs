use crate::error::TabulaResult;
use serde::Deserialize;

/// Engine-wide settings shared by every command built from a data source.
///
/// ```ignore
/// let config = EngineConfig::from_toml_str(r#"
///     strict_mode = true
///     max_logged_sql_length = 500
/// "#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Treat best-effort fallbacks (limit without sort, unmatched routine
    /// arguments) as errors.
    pub strict_mode: bool,
    /// Override the dialect's maximum parameter count per statement.
    pub max_parameters: Option<usize>,
    /// Cap the number of rows per batch insert statement.
    pub max_rows_per_batch: Option<usize>,
    /// Emit prepared statements as `tabula.sql` debug events.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_parameters: None,
            max_rows_per_batch: None,
            log_sql: true,
            max_logged_sql_length: Some(200),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> TabulaResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn strict(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    pub fn with_max_parameters(mut self, max: usize) -> Self {
        self.max_parameters = Some(max);
        self
    }

    pub fn with_max_rows_per_batch(mut self, max: usize) -> Self {
        self.max_rows_per_batch = Some(max);
        self
    }

    pub fn disable_sql_logging(mut self) -> Self {
        self.log_sql = false;
        self
    }

    pub fn with_max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_logged_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while end > 0 && !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}
