use crate::dialect::Dialect;
use crate::error::IngestError;
use std::collections::HashMap;
use std::path::Path;

pub mod cfr;
pub mod configs;
pub mod finra;

pub use crate::types::DialectKind;
use configs::DialectsConfig;

pub fn dialect_for(kind: DialectKind) -> &'static Dialect {
    match kind {
        DialectKind::Cfr => &cfr::CFR_DIALECT,
        DialectKind::Finra => &finra::FINRA_DIALECT,
    }
}

/// Resolves dialect names. Dialects loaded from configuration shadow the
/// built-in ones of the same name.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    configured: HashMap<String, Dialect>,
}

impl DialectRegistry {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DialectsConfig) -> Result<Self, IngestError> {
        let mut configured = HashMap::new();
        for spec in &config.dialects {
            let dialect = Dialect::compile(spec)?;
            configured.insert(spec.name.to_ascii_lowercase(), dialect);
        }
        Ok(Self { configured })
    }

    /// Built-ins plus `$CONFIGS_PATH/dialects.json` when that file exists.
    pub fn load_default() -> Result<Self, IngestError> {
        Self::load(&configs::default_config_path())
    }

    /// Built-ins plus the dialects in `path`; a missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        if !path.exists() {
            tracing::info!(
                "[regtree] No dialect config at {}, using built-in dialects",
                path.display()
            );
            return Ok(Self::builtin());
        }
        let config = DialectsConfig::load_from_file(path)?;
        tracing::info!(
            "[regtree] Loaded {} dialect(s) from {}",
            config.dialects.len(),
            path.display()
        );
        Self::from_config(&config)
    }

    pub fn get(&self, name: &str) -> Result<&Dialect, IngestError> {
        if let Some(dialect) = self.configured.get(&name.trim().to_ascii_lowercase()) {
            return Ok(dialect);
        }
        DialectKind::from_name(name)
            .map(dialect_for)
            .ok_or_else(|| IngestError::UnknownDialect(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = DialectKind::ALL
            .iter()
            .map(|kind| kind.as_str().to_string())
            .chain(self.configured.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
