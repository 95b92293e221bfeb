//! Configuration validation.
//!
//! Checks a loaded [`RecastConfig`] for values the runtime would reject or
//! silently adjust, and reports them as diagnostics.

use std::collections::HashSet;

use {
    chrono::NaiveDateTime,
    recast_skills::{CreateSkillEvent, Error as SkillError},
    tracing::debug,
};

use crate::schema::RecastConfig;

/// Refresh intervals above this only delay charges becoming visible.
const SLOW_INTERVAL_MS: u64 = 60_000;

const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "refresh", "logging", "skill"
    pub category: &'static str,
    /// Dotted path, e.g. "skills[1].name"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}: {}", self.severity, self.category, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &RecastConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let interval_ms = config.refresh.interval_ms;
    if interval_ms == 0 {
        result.push(
            Severity::Error,
            "refresh",
            "refresh.interval_ms",
            "must be greater than zero",
        );
    } else if interval_ms > SLOW_INTERVAL_MS {
        result.push(
            Severity::Warning,
            "refresh",
            "refresh.interval_ms",
            format!("{interval_ms}ms delays recharges by up to that long"),
        );
    }

    // Bare levels only; anything with a target or `=` is a full filter directive.
    let level = config.logging.level.trim().to_ascii_lowercase();
    if !level.contains(['=', ',']) && !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
        result.push(
            Severity::Warning,
            "logging",
            "logging.level",
            format!(
                "unknown level '{}', expected one of {}",
                config.logging.level,
                KNOWN_LOG_LEVELS.join(", ")
            ),
        );
    }

    let mut names = HashSet::new();
    for (i, draft) in config.skills.iter().enumerate() {
        // Any instant works here; only the draft's own fields are checked.
        if let Err(e) = CreateSkillEvent::from_draft(draft.clone(), NaiveDateTime::default()) {
            let field = match &e {
                SkillError::Invalid { field, .. } => field_path(field),
                _ => "",
            };
            result.push(
                Severity::Error,
                "skill",
                format!("skills[{i}]{field}"),
                e.to_string(),
            );
            continue;
        }
        let key = draft.name.trim().to_lowercase();
        if !names.insert(key) {
            result.push(
                Severity::Warning,
                "skill",
                format!("skills[{i}].name"),
                format!("duplicate skill name '{}'", draft.name.trim()),
            );
        }
    }

    debug!(
        errors = result.count(Severity::Error),
        warnings = result.count(Severity::Warning),
        "config validated"
    );
    result
}

fn field_path(field: &str) -> &'static str {
    match field {
        "skill name" => ".name",
        "casting charge limit" => ".castingChargeLimit",
        "recast time" => ".recast.recastTimeMs",
        "interval days" => ".recast.intervalDays",
        "interval weeks" => ".recast.intervalWeeks",
        _ => "",
    }
}
