//! Core data types for skills and their charge state.

use std::fmt;

use {
    chrono::NaiveDateTime,
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

use crate::{Error, Result, policy::RecastPolicy};

/// Maximum length of a skill name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Upper bound for a skill's charge limit.
pub const MAX_CHARGE_LIMIT: u32 = 1000;

/// Unique identity of a skill, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(Uuid);

impl SkillId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SkillId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SkillId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for SkillId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::invalid("skill id", e.to_string()))
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A trimmed, non-empty skill name of at most [`MAX_NAME_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkillName(String);

impl SkillName {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid("skill name", "must not be empty"));
        }
        let len = trimmed.chars().count();
        if len > MAX_NAME_CHARS {
            return Err(Error::invalid(
                "skill name",
                format!("{len} characters exceeds the limit of {MAX_NAME_CHARS}"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SkillName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SkillName> for String {
    fn from(value: SkillName) -> Self {
        value.0
    }
}

impl fmt::Display for SkillName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a charge limit against `1..=MAX_CHARGE_LIMIT`.
pub fn validate_charge_limit(limit: u32) -> Result<u32> {
    if !(1..=MAX_CHARGE_LIMIT).contains(&limit) {
        return Err(Error::invalid(
            "casting charge limit",
            format!("{limit} is outside 1..={MAX_CHARGE_LIMIT}"),
        ));
    }
    Ok(limit)
}

/// A reusable skill and its charge state.
///
/// Values are immutable from the outside: every charge operation returns a
/// new `Skill`. `casting_charge` always stays within `0..=casting_charge_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub(crate) id: SkillId,
    pub(crate) name: SkillName,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) last_used_at: Option<NaiveDateTime>,
    pub(crate) casting_charge: u32,
    pub(crate) casting_charge_limit: u32,
    pub(crate) recast: RecastPolicy,
    /// Anchor for the next recast computation. Moves only when a recast
    /// period completes or a use starts a fresh cooldown.
    pub(crate) recasting_from: NaiveDateTime,
}

impl Skill {
    #[must_use]
    pub fn id(&self) -> SkillId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &SkillName {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    #[must_use]
    pub fn last_used_at(&self) -> Option<NaiveDateTime> {
        self.last_used_at
    }

    #[must_use]
    pub fn casting_charge(&self) -> u32 {
        self.casting_charge
    }

    #[must_use]
    pub fn casting_charge_limit(&self) -> u32 {
        self.casting_charge_limit
    }

    #[must_use]
    pub fn recast(&self) -> &RecastPolicy {
        &self.recast
    }

    #[must_use]
    pub fn recasting_from(&self) -> NaiveDateTime {
        self.recasting_from
    }
}
