//! Read and write capability surfaces of a skill store.

use std::sync::Arc;

use {async_trait::async_trait, tokio::sync::watch};

use crate::{
    Result,
    events::{
        AddChargeEvent, CreateSkillEvent, DeleteSkillEvent, RefreshChargeEvent,
        RemoveChargeEvent, UseSkillEvent,
    },
    types::{Skill, SkillId},
};

/// A fully-formed, immutable view of every skill, ordered by creation time.
///
/// Skills untouched by a write keep their `Arc` across snapshots.
pub type SkillSnapshot = Arc<Vec<Arc<Skill>>>;

/// Read side of the store.
#[async_trait]
pub trait SkillReader: Send + Sync {
    /// Subscribe to snapshots. A new one is published after every write that
    /// changed something.
    fn skills(&self) -> watch::Receiver<SkillSnapshot>;

    async fn get_all(&self) -> Vec<Arc<Skill>>;

    async fn get_by_id(&self, skill_id: SkillId) -> Option<Arc<Skill>>;
}

/// Write side of the store. Each handler applies one event atomically.
#[async_trait]
pub trait SkillMutator: Send + Sync {
    async fn handle_create(&self, event: CreateSkillEvent) -> Result<SkillId>;

    /// Fails with `SkillNotFound` or `OutOfCharge`.
    async fn handle_use(&self, event: UseSkillEvent) -> Result<()>;

    /// Removing an unknown id succeeds and changes nothing.
    async fn handle_delete(&self, event: DeleteSkillEvent) -> Result<()>;

    async fn handle_add_charge(&self, event: AddChargeEvent) -> Result<()>;

    async fn handle_remove_charge(&self, event: RemoveChargeEvent) -> Result<()>;

    /// Returns how many skills were rewritten. A skill that cannot be
    /// refreshed stays as it was without holding back the others, and the
    /// first such failure is returned after the write.
    async fn handle_refresh(&self, event: RefreshChargeEvent) -> Result<usize>;
}

/// What changed in the store, delivered after the write is visible.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillNotification {
    Created { skill: Arc<Skill> },
    Updated { skill: Arc<Skill> },
    Removed { skill_id: SkillId },
}

/// Callback for store change notifications.
pub type NotifyFn = Arc<dyn Fn(SkillNotification) + Send + Sync>;
