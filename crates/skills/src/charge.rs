//! Charge logic: pure transformations over [`Skill`] values.

use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    Result,
    events::CreateSkillEvent,
    types::{Skill, SkillId},
};

impl Skill {
    /// Build a fresh skill from a validated create event.
    ///
    /// Starts with one charge when initially available, otherwise none, and
    /// anchors the first recast at the creation instant.
    #[must_use]
    pub fn create(event: &CreateSkillEvent) -> Self {
        let created_at = event.created_at();
        Self {
            id: SkillId::new(),
            name: event.name().clone(),
            created_at,
            last_used_at: None,
            casting_charge: u32::from(event.initially_available()),
            casting_charge_limit: event.casting_charge_limit(),
            recast: *event.recast(),
            recasting_from: created_at,
        }
    }

    #[must_use]
    pub fn is_unused(&self) -> bool {
        self.last_used_at.is_none()
    }

    #[must_use]
    pub fn has_charge(&self) -> bool {
        self.casting_charge > 0
    }

    #[must_use]
    pub fn is_full_charged(&self) -> bool {
        self.casting_charge >= self.casting_charge_limit
    }

    /// Whether a charge is currently on its way back through the passage of time.
    #[must_use]
    pub fn will_recast_over_time(&self) -> bool {
        !self.is_full_charged() && self.recast.is_time_based()
    }

    /// When the next charge comes back, or `None` if none is scheduled.
    pub fn recast_at(&self) -> Result<Option<NaiveDateTime>> {
        if !self.will_recast_over_time() {
            return Ok(None);
        }
        self.recast.ready_at(self.recasting_from).map(Some)
    }

    /// Time left until [`Self::recast_at`]; non-positive once it has passed.
    pub fn until_recast(&self, now: NaiveDateTime) -> Result<Option<TimeDelta>> {
        if !self.will_recast_over_time() {
            return Ok(None);
        }
        self.recast
            .until_ready(self.recasting_from, now)
            .map(Some)
    }

    /// Credit every recast period completed by `now`.
    ///
    /// Each credited period moves the anchor to that period's ready instant,
    /// so the next period is derived from it. Returns `None` when nothing
    /// changed.
    pub fn refresh_charge(&self, now: NaiveDateTime) -> Result<Option<Self>> {
        if !self.recast.is_time_based() {
            return Ok(None);
        }

        let mut casting_charge = self.casting_charge;
        let mut recasting_from = self.recasting_from;
        while casting_charge < self.casting_charge_limit {
            let ready_at = self.recast.ready_at(recasting_from)?;
            if ready_at > now {
                break;
            }
            casting_charge += 1;
            recasting_from = ready_at;
        }

        if casting_charge == self.casting_charge {
            return Ok(None);
        }
        Ok(Some(Self {
            casting_charge,
            recasting_from,
            ..self.clone()
        }))
    }

    /// Consume one charge at `used_at`.
    ///
    /// A recast already in flight keeps its anchor. From a full pool the use
    /// starts a fresh cooldown anchored at `used_at`. Callers check
    /// [`Self::has_charge`] first.
    #[must_use]
    pub fn use_charge(&self, used_at: NaiveDateTime) -> Self {
        let recasting_from = if self.will_recast_over_time() {
            self.recasting_from
        } else {
            used_at
        };
        Self {
            last_used_at: Some(used_at),
            casting_charge: self.casting_charge.saturating_sub(1),
            recasting_from,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_charge(&self) -> Self {
        Self {
            casting_charge: self
                .casting_charge
                .saturating_add(1)
                .min(self.casting_charge_limit),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn remove_charge(&self) -> Self {
        Self {
            casting_charge: self.casting_charge.saturating_sub(1),
            ..self.clone()
        }
    }
}
