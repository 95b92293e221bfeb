//! In-memory skill store: the single writer for a collection of skills.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tokio::sync::{RwLock, watch},
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    events::{
        AddChargeEvent, CreateSkillEvent, DeleteSkillEvent, RefreshChargeEvent,
        RemoveChargeEvent, UseSkillEvent,
    },
    store::{NotifyFn, SkillMutator, SkillNotification, SkillReader, SkillSnapshot},
    types::{Skill, SkillId},
};

/// Skill store backed by an immutable snapshot behind a write lock.
///
/// Every handler holds the write lock for its whole lookup-compute-replace
/// cycle, so mutations never interleave and readers only see complete
/// snapshots.
pub struct InMemorySkillStore {
    skills: RwLock<SkillSnapshot>,
    snapshot_tx: watch::Sender<SkillSnapshot>,
    on_notify: Option<NotifyFn>,
}

impl InMemorySkillStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(None)
    }

    /// Create a store that reports each change to `on_notify`.
    #[must_use]
    pub fn with_notify(on_notify: NotifyFn) -> Self {
        Self::with_config(Some(on_notify))
    }

    fn with_config(on_notify: Option<NotifyFn>) -> Self {
        let initial: SkillSnapshot = Arc::new(Vec::new());
        let (snapshot_tx, _) = watch::channel(Arc::clone(&initial));
        Self {
            skills: RwLock::new(initial),
            snapshot_tx,
            on_notify,
        }
    }

    fn notify(&self, notification: SkillNotification) {
        if let Some(ref notify_fn) = self.on_notify {
            notify_fn(notification);
        }
    }

    /// Install `next` as the current snapshot and hand it to subscribers.
    fn publish(&self, current: &mut SkillSnapshot, next: Vec<Arc<Skill>>) {
        let snapshot = Arc::new(next);
        *current = Arc::clone(&snapshot);
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Look a skill up, transform it, and write the result back.
    async fn modify<F>(&self, skill_id: SkillId, action: &'static str, f: F) -> Result<Arc<Skill>>
    where
        F: FnOnce(&Skill) -> Result<Skill>,
    {
        let mut skills = self.skills.write().await;
        let current = find(&skills, skill_id).ok_or_else(|| {
            warn!(%skill_id, action, "skill not found");
            Error::skill_not_found(skill_id)
        })?;
        let updated = Arc::new(f(current).inspect_err(|e| {
            warn!(%skill_id, action, error = %e, "rejected");
        })?);
        let next = upsert(&skills, Arc::clone(&updated));
        self.publish(&mut skills, next);
        drop(skills);

        debug!(
            %skill_id,
            action,
            charge = updated.casting_charge(),
            limit = updated.casting_charge_limit(),
            "skill updated"
        );
        self.notify(SkillNotification::Updated {
            skill: Arc::clone(&updated),
        });
        Ok(updated)
    }
}

impl Default for InMemorySkillStore {
    fn default() -> Self {
        Self::new()
    }
}

fn find(skills: &[Arc<Skill>], skill_id: SkillId) -> Option<&Skill> {
    skills.iter().find(|s| s.id() == skill_id).map(Arc::as_ref)
}

/// Replace the entry with the same id in place, or append a new one, and keep
/// the list ordered by creation. Skills created at the same instant keep their
/// relative order across write-backs.
fn upsert(skills: &[Arc<Skill>], skill: Arc<Skill>) -> Vec<Arc<Skill>> {
    let mut next = skills.to_vec();
    match next.iter_mut().find(|s| s.id() == skill.id()) {
        Some(slot) => *slot = skill,
        None => next.push(skill),
    }
    next.sort_by_key(|s| s.created_at());
    next
}

#[async_trait]
impl SkillReader for InMemorySkillStore {
    fn skills(&self) -> watch::Receiver<SkillSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn get_all(&self) -> Vec<Arc<Skill>> {
        self.skills.read().await.to_vec()
    }

    async fn get_by_id(&self, skill_id: SkillId) -> Option<Arc<Skill>> {
        let skills = self.skills.read().await;
        skills.iter().find(|s| s.id() == skill_id).cloned()
    }
}

#[async_trait]
impl SkillMutator for InMemorySkillStore {
    async fn handle_create(&self, event: CreateSkillEvent) -> Result<SkillId> {
        let skill = Arc::new(Skill::create(&event));
        let skill_id = skill.id();

        let mut skills = self.skills.write().await;
        let next = upsert(&skills, Arc::clone(&skill));
        self.publish(&mut skills, next);
        drop(skills);

        info!(%skill_id, name = %skill.name(), "skill created");
        self.notify(SkillNotification::Created { skill });
        Ok(skill_id)
    }

    async fn handle_use(&self, event: UseSkillEvent) -> Result<()> {
        self.modify(event.skill_id, "use", |skill| {
            if !skill.has_charge() {
                return Err(Error::out_of_charge(skill.id()));
            }
            Ok(skill.use_charge(event.used_at))
        })
        .await?;
        Ok(())
    }

    async fn handle_delete(&self, event: DeleteSkillEvent) -> Result<()> {
        let skill_id = event.skill_id;
        let mut skills = self.skills.write().await;
        if find(&skills, skill_id).is_none() {
            debug!(%skill_id, "delete of unknown skill ignored");
            return Ok(());
        }
        let next = skills
            .iter()
            .filter(|s| s.id() != skill_id)
            .cloned()
            .collect();
        self.publish(&mut skills, next);
        drop(skills);

        info!(%skill_id, "skill removed");
        self.notify(SkillNotification::Removed { skill_id });
        Ok(())
    }

    async fn handle_add_charge(&self, event: AddChargeEvent) -> Result<()> {
        self.modify(event.skill_id, "add-charge", |skill| Ok(skill.add_charge()))
            .await?;
        Ok(())
    }

    async fn handle_remove_charge(&self, event: RemoveChargeEvent) -> Result<()> {
        self.modify(event.skill_id, "remove-charge", |skill| {
            Ok(skill.remove_charge())
        })
        .await?;
        Ok(())
    }

    async fn handle_refresh(&self, event: RefreshChargeEvent) -> Result<usize> {
        let mut skills = self.skills.write().await;

        // A skill whose schedule cannot be computed keeps its current value;
        // the rest are still credited and the first failure is returned.
        let mut failure = None;
        let mut refreshed = Vec::new();
        let next: Vec<Arc<Skill>> = skills
            .iter()
            .map(|skill| match skill.refresh_charge(event.now) {
                Ok(Some(updated)) => {
                    let updated = Arc::new(updated);
                    refreshed.push(Arc::clone(&updated));
                    updated
                },
                Ok(None) => Arc::clone(skill),
                Err(e) => {
                    warn!(skill_id = %skill.id(), error = %e, "refresh rejected, skill left unchanged");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                    Arc::clone(skill)
                },
            })
            .collect();

        let count = refreshed.len();
        if count > 0 {
            self.publish(&mut skills, next);
        }
        drop(skills);

        if count > 0 {
            debug!(count, now = %event.now, "charges refreshed");
            for skill in refreshed {
                self.notify(SkillNotification::Updated { skill });
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }
}
