//! Commands that drive every mutation of the skill store.
//!
//! Events are constructed by the presentation layer, already validated, and
//! consumed exactly once by a [`SkillMutator`](crate::store::SkillMutator).

use {
    chrono::NaiveDateTime,
    serde::{Deserialize, Serialize},
};

use crate::{
    Result,
    policy::RecastPolicy,
    types::{SkillId, SkillName, validate_charge_limit},
};

/// Raw input for creating a skill, as it arrives from a form or a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDraft {
    pub name: String,
    pub casting_charge_limit: u32,
    pub recast: RecastPolicy,
    #[serde(default = "default_true")]
    pub initially_available: bool,
}

fn default_true() -> bool {
    true
}

/// Create a skill. Only constructible through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSkillEvent {
    name: SkillName,
    casting_charge_limit: u32,
    recast: RecastPolicy,
    initially_available: bool,
    created_at: NaiveDateTime,
}

impl CreateSkillEvent {
    pub fn new(
        name: SkillName,
        casting_charge_limit: u32,
        recast: RecastPolicy,
        initially_available: bool,
        created_at: NaiveDateTime,
    ) -> Result<Self> {
        let casting_charge_limit = validate_charge_limit(casting_charge_limit)?;
        recast.validate()?;
        Ok(Self {
            name,
            casting_charge_limit,
            recast,
            initially_available,
            created_at,
        })
    }

    /// Validate a raw draft, stamping it with its creation instant.
    pub fn from_draft(draft: SkillDraft, created_at: NaiveDateTime) -> Result<Self> {
        Self::new(
            SkillName::new(draft.name)?,
            draft.casting_charge_limit,
            draft.recast,
            draft.initially_available,
            created_at,
        )
    }

    #[must_use]
    pub fn name(&self) -> &SkillName {
        &self.name
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
    pub fn initially_available(&self) -> bool {
        self.initially_available
    }

    #[must_use]
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// Consume one charge of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseSkillEvent {
    pub skill_id: SkillId,
    pub used_at: NaiveDateTime,
}

/// Remove a skill. Removing an absent skill is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSkillEvent {
    pub skill_id: SkillId,
}

/// Grant one charge, capped at the skill's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChargeEvent {
    pub skill_id: SkillId,
}

/// Take away one charge without recording a use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveChargeEvent {
    pub skill_id: SkillId,
}

/// Credit every recast period that has completed by `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshChargeEvent {
    pub now: NaiveDateTime,
}
