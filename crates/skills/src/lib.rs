//! Skill charges and recast scheduling.
//!
//! A skill holds a bounded number of charges. Using it spends one; a recast
//! policy (fixed duration, daily slot, weekly slot, or manual) decides when
//! spent charges come back. The [`store_memory::InMemorySkillStore`] applies
//! events one at a time and publishes immutable snapshots to subscribers,
//! and the [`refresh::RefreshTicker`] feeds it the passage of time.

mod charge;
pub mod clock;
pub mod error;
pub mod events;
pub mod policy;
pub mod refresh;
pub mod store;
pub mod store_memory;
pub mod types;

pub use {
    error::{Error, Result},
    events::{
        AddChargeEvent, CreateSkillEvent, DeleteSkillEvent, RefreshChargeEvent,
        RemoveChargeEvent, SkillDraft, UseSkillEvent,
    },
    policy::RecastPolicy,
    store::{SkillMutator, SkillReader, SkillSnapshot},
    types::{Skill, SkillId, SkillName},
};
