// src/pool/filter.rs
use crate::pool::PoolCollection;
use crate::utils::error::ConfigError;
use regex::Regex;

/// Which records a set of identifier patterns selects.
#[derive(Debug, Clone)]
pub enum IdentifierFilter {
    /// No filtering.
    All,
    /// Keep records whose identifier matches any pattern.
    Include(Vec<Regex>),
    /// Keep records whose identifier matches none of the patterns.
    Exclude(Vec<Regex>),
}

/// Compiles a pattern so that it must match the whole identifier.
fn compile_whole(pattern: &str) -> Result<Regex, ConfigError> {
    // Validate the pattern on its own first so errors point at what the user typed
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl IdentifierFilter {
    /// Builds a filter from the include/exclude options; giving both is an error.
    pub fn from_patterns(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        match (include.is_empty(), exclude.is_empty()) {
            (false, false) => Err(ConfigError::IncludeAndExclude),
            (false, true) => Ok(Self::Include(
                include.iter().map(|p| compile_whole(p)).collect::<Result<_, _>>()?,
            )),
            (true, false) => Ok(Self::Exclude(
                exclude.iter().map(|p| compile_whole(p)).collect::<Result<_, _>>()?,
            )),
            (true, true) => Ok(Self::All),
        }
    }

    pub fn selects(&self, identifier: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(patterns) => patterns.iter().any(|re| re.is_match(identifier)),
            Self::Exclude(patterns) => !patterns.iter().any(|re| re.is_match(identifier)),
        }
    }

    /// Keeps the selected records, preserving order.
    pub fn apply(&self, pool: PoolCollection) -> PoolCollection {
        if let Self::All = self {
            return pool;
        }
        let before = pool.len();
        let kept: PoolCollection = pool
            .into_records()
            .into_iter()
            .filter(|record| self.selects(&record.identifier))
            .collect();
        tracing::info!("Filter kept {} of {} question(s)", kept.len(), before);
        kept
    }
}
