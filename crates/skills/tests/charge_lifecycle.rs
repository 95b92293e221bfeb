#![allow(clippy::unwrap_used, clippy::expect_used)]
use {
    chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday},
    recast_skills::{
        AddChargeEvent, CreateSkillEvent, DeleteSkillEvent, Error, RecastPolicy,
        RefreshChargeEvent, SkillDraft, SkillMutator, SkillReader, UseSkillEvent,
        store_memory::InMemorySkillStore,
    },
};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn draft(name: &str, limit: u32, recast: RecastPolicy, initially_available: bool) -> SkillDraft {
    SkillDraft {
        name: name.into(),
        casting_charge_limit: limit,
        recast,
        initially_available,
    }
}

#[tokio::test]
async fn single_charge_duration_skill() {
    let store = InMemorySkillStore::new();
    let recast = RecastPolicy::duration(TimeDelta::seconds(60)).unwrap();
    let event = CreateSkillEvent::from_draft(draft("Dash", 1, recast, true), t0()).unwrap();
    let id = store.handle_create(event).await.unwrap();
    assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 1);

    store
        .handle_use(UseSkillEvent {
            skill_id: id,
            used_at: t0(),
        })
        .await
        .unwrap();
    let skill = store.get_by_id(id).await.unwrap();
    assert_eq!(skill.casting_charge(), 0);
    assert_eq!(skill.recasting_from(), t0());

    let err = store
        .handle_use(UseSkillEvent {
            skill_id: id,
            used_at: t0(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OutOfCharge { .. }));
    assert!(!err.is_defect());

    store
        .handle_refresh(RefreshChargeEvent {
            now: t0() + TimeDelta::seconds(59),
        })
        .await
        .unwrap();
    assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 0);

    store
        .handle_refresh(RefreshChargeEvent {
            now: t0() + TimeDelta::seconds(60),
        })
        .await
        .unwrap();
    assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 1);
}

#[tokio::test]
async fn long_absence_credits_every_period() {
    let store = InMemorySkillStore::new();
    let recast = RecastPolicy::duration(TimeDelta::seconds(30)).unwrap();
    let event = CreateSkillEvent::from_draft(draft("Arrow", 5, recast, false), t0()).unwrap();
    let id = store.handle_create(event).await.unwrap();

    let now = t0() + TimeDelta::seconds(125);
    assert_eq!(
        store
            .handle_refresh(RefreshChargeEvent { now })
            .await
            .unwrap(),
        1
    );
    let skill = store.get_by_id(id).await.unwrap();
    assert_eq!(skill.casting_charge(), 4);
    assert_eq!(skill.recasting_from(), t0() + TimeDelta::seconds(120));

    // Same instant again: nothing left to credit.
    assert_eq!(
        store
            .handle_refresh(RefreshChargeEvent { now })
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn weekly_skill_comes_back_on_its_day() {
    let store = InMemorySkillStore::new();
    let recast = RecastPolicy::weekly(Weekday::Mon, NaiveTime::from_hms_opt(5, 0, 0).unwrap(), 0);
    let event = CreateSkillEvent::from_draft(draft("Raid", 1, recast, true), t0()).unwrap();
    let id = store.handle_create(event).await.unwrap();

    let used_at = t0() + TimeDelta::hours(1);
    store
        .handle_use(UseSkillEvent {
            skill_id: id,
            used_at,
        })
        .await
        .unwrap();
    let skill = store.get_by_id(id).await.unwrap();
    let monday = NaiveDate::from_ymd_opt(2024, 5, 20)
        .unwrap()
        .and_hms_opt(5, 0, 0)
        .unwrap();
    assert_eq!(skill.recast_at().unwrap(), Some(monday));
    assert_eq!(
        skill.until_recast(used_at).unwrap(),
        Some(monday - used_at)
    );

    store
        .handle_refresh(RefreshChargeEvent {
            now: monday - TimeDelta::seconds(1),
        })
        .await
        .unwrap();
    assert!(!store.get_by_id(id).await.unwrap().has_charge());

    store
        .handle_refresh(RefreshChargeEvent { now: monday })
        .await
        .unwrap();
    assert!(store.get_by_id(id).await.unwrap().has_charge());
}

#[tokio::test]
async fn manual_skill_only_moves_on_explicit_events() {
    let store = InMemorySkillStore::new();
    let event =
        CreateSkillEvent::from_draft(draft("Potion", 2, RecastPolicy::Manual, false), t0()).unwrap();
    let id = store.handle_create(event).await.unwrap();

    store
        .handle_refresh(RefreshChargeEvent {
            now: t0() + TimeDelta::days(365),
        })
        .await
        .unwrap();
    assert_eq!(store.get_by_id(id).await.unwrap().casting_charge(), 0);

    store
        .handle_add_charge(AddChargeEvent { skill_id: id })
        .await
        .unwrap();
    let skill = store.get_by_id(id).await.unwrap();
    assert_eq!(skill.casting_charge(), 1);
    assert!(skill.recast_at().unwrap().is_none());

    store
        .handle_delete(DeleteSkillEvent { skill_id: id })
        .await
        .unwrap();
    store
        .handle_delete(DeleteSkillEvent { skill_id: id })
        .await
        .unwrap();
    assert!(store.get_all().await.is_empty());
}

#[test]
fn oversized_intervals_are_rejected_up_front() {
    let recast = RecastPolicy::daily(NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 200_000_000);
    let err = CreateSkillEvent::from_draft(draft("Slow", 1, recast, false), t0()).unwrap_err();
    assert!(matches!(
        err,
        Error::Invalid {
            field: "interval days",
            ..
        }
    ));
    assert!(!err.is_defect());
}
