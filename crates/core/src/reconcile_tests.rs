// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::action::JobQuery;
use serde_json::json;

fn changes(value: Value) -> Changes {
    value.as_object().cloned().unwrap()
}

#[test]
fn optimistic_apply_creates_pending_record() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "A"})));

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.field("title"), Some(&json!("A")));
    assert_eq!(entity.field("id"), Some(&json!("job-1")));
    assert!(entity.is_optimistic);
    assert_eq!(entity.sync_status, SyncStatus::Pending);
    assert_eq!(store.ids(Collection::Jobs), ["job-1".to_string()]);
}

#[test]
fn optimistic_apply_merges_into_existing() {
    let mut store = Store::new();
    store
        .upsert(Collection::Jobs, &json!({"id": "job-1", "title": "A", "budget": 100}))
        .unwrap();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "B"})));

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.to_value(), json!({"id": "job-1", "title": "B", "budget": 100}));
    assert_eq!(store.ids(Collection::Jobs).len(), 1);
}

#[test]
fn confirmed_apply_server_wins_and_clears_flags() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "B"})));
    store.apply_confirmed(Collection::Jobs, "job-1", &json!({"id": "job-1", "title": "B2"}));

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.field("title"), Some(&json!("B2")));
    assert!(!entity.is_optimistic);
    assert_eq!(entity.sync_status, SyncStatus::Synced);
}

#[test]
fn confirmed_apply_without_body_only_clears_flags() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Profiles, "u-1", &changes(json!({"bio": "hi"})));
    store.apply_confirmed(Collection::Profiles, "u-1", &Value::Null);

    let entity = store.get(Collection::Profiles, "u-1").unwrap();
    assert_eq!(entity.field("bio"), Some(&json!("hi")));
    assert!(!entity.is_optimistic);

    store.apply_confirmed(Collection::Profiles, "u-2", &Value::Null);
    assert!(store.get(Collection::Profiles, "u-2").is_none());
}

#[test]
fn confirmed_apply_moves_provisional_id_to_server_id() {
    let mut store = Store::new();
    store.upsert(Collection::Jobs, &json!({"id": "job-0"})).unwrap();
    store.apply_optimistic(Collection::Jobs, "job-tmp", &changes(json!({"title": "New"})));
    store.upsert(Collection::Jobs, &json!({"id": "job-9"})).unwrap();

    store.apply_confirmed(Collection::Jobs, "job-tmp", &json!({"id": "srv-42", "status": "open"}));

    assert!(store.get(Collection::Jobs, "job-tmp").is_none());
    let entity = store.get(Collection::Jobs, "srv-42").unwrap();
    assert_eq!(
        entity.to_value(),
        json!({"id": "srv-42", "title": "New", "status": "open"})
    );
    assert_eq!(
        store.ids(Collection::Jobs),
        ["job-0".to_string(), "srv-42".to_string(), "job-9".to_string()]
    );
}

#[test]
fn confirmed_apply_onto_already_pushed_server_id() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-tmp", &changes(json!({"title": "New"})));
    store
        .upsert(Collection::Jobs, &json!({"id": "srv-1", "title": "New"}))
        .unwrap();

    store.apply_confirmed(Collection::Jobs, "job-tmp", &json!({"id": "srv-1", "title": "New!"}));

    assert_eq!(store.ids(Collection::Jobs), ["srv-1".to_string()]);
    assert_eq!(
        store.get(Collection::Jobs, "srv-1").unwrap().field("title"),
        Some(&json!("New!"))
    );
}

#[test]
fn push_upsert_overwrites_optimistic_state() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "B", "draft": true})));

    let event = PushEvent::Upsert {
        collection: Collection::Jobs,
        entity: json!({"id": "job-1", "title": "Server"}),
    };
    store.apply_push(&event).unwrap();

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.to_value(), json!({"id": "job-1", "title": "Server"}));
    assert!(!entity.is_optimistic);
    assert_eq!(entity.sync_status, SyncStatus::Synced);
    assert!(store.pending_optimistic_ids(Collection::Jobs).is_empty());
}

#[test]
fn push_delete_removes_from_ids() {
    let mut store = Store::new();
    store.upsert(Collection::Messages, &json!({"id": "m-1"})).unwrap();
    store.upsert(Collection::Messages, &json!({"id": "m-2"})).unwrap();

    let event = PushEvent::Deleted {
        collection: Collection::Messages,
        id: "m-1".to_string(),
    };
    store.apply_push(&event).unwrap();

    assert!(store.get(Collection::Messages, "m-1").is_none());
    assert_eq!(store.ids(Collection::Messages), ["m-2".to_string()]);
}

#[test]
fn push_upsert_rejects_malformed_snapshot() {
    let mut store = Store::new();
    let event = PushEvent::Upsert {
        collection: Collection::Jobs,
        entity: json!({"title": "no id"}),
    };
    assert!(store.apply_push(&event).is_err());
    assert!(store.ids(Collection::Jobs).is_empty());
}

#[test]
fn push_event_wire_format() {
    let event: PushEvent = serde_json::from_value(json!({
        "type": "upsert",
        "collection": "messages",
        "entity": {"id": "m-1", "body": "hi"}
    }))
    .unwrap();
    assert_eq!(event.collection(), Collection::Messages);

    let deleted: PushEvent =
        serde_json::from_value(json!({"type": "deleted", "collection": "jobs", "id": "job-1"}))
            .unwrap();
    assert_eq!(
        deleted,
        PushEvent::Deleted {
            collection: Collection::Jobs,
            id: "job-1".to_string()
        }
    );
}

#[test]
fn remove_is_unconditional() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "A"})));
    assert!(store.remove(Collection::Jobs, "job-1"));
    assert!(!store.remove(Collection::Jobs, "job-1"));
    assert!(store.ids(Collection::Jobs).is_empty());
}

#[test]
fn mark_failed_keeps_optimistic_value() {
    let mut store = Store::new();
    store.apply_optimistic(Collection::Jobs, "job-1", &changes(json!({"title": "B"})));
    assert!(store.mark_failed(Collection::Jobs, "job-1"));

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.sync_status, SyncStatus::Failed);
    assert!(entity.is_optimistic);
    assert_eq!(entity.field("title"), Some(&json!("B")));
    assert!(!store.mark_failed(Collection::Jobs, "missing"));
}

#[test]
fn apply_result_for_each_action_family() {
    let mut store = Store::new();

    let fetched = store.apply_result(
        &Action::FetchJobs { query: JobQuery::default() },
        &json!([{"id": "job-1", "title": "A"}, {"id": "job-2"}, {"bad": true}]),
    );
    assert_eq!(fetched, 2);
    assert_eq!(store.ids(Collection::Jobs).len(), 2);

    let updated = store.apply_result(
        &Action::update_job("job-1", changes(json!({"title": "B"}))),
        &json!({"id": "job-1", "title": "B"}),
    );
    assert_eq!(updated, 1);
    assert_eq!(
        store.get(Collection::Jobs, "job-1").unwrap().field("title"),
        Some(&json!("B"))
    );

    let deleted = store.apply_result(&Action::DeleteJob { id: "job-2".into() }, &Value::Null);
    assert_eq!(deleted, 1);

    let profile = store.apply_result(
        &Action::FetchProfile { id: "u-1".into() },
        &json!({"id": "u-1", "name": "Ana"}),
    );
    assert_eq!(profile, 1);
    assert!(store.get(Collection::Profiles, "u-1").is_some());

    let login = store.apply_result(
        &Action::Login { email: "a@b.c".into(), password: "pw".into() },
        &json!({"token": "t"}),
    );
    assert_eq!(login, 0);
}

#[test]
fn job_title_change_offline_then_confirmed() {
    let mut store = Store::new();
    store
        .upsert(Collection::Jobs, &json!({"id": "job-1", "title": "A"}))
        .unwrap();

    let action = Action::update_job("job-1", changes(json!({"title": "B"})));
    assert!(store.apply_action_optimistic(&action));

    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.field("title"), Some(&json!("B")));
    assert!(entity.is_optimistic);
    assert_eq!(store.pending_optimistic_ids(Collection::Jobs), vec!["job-1"]);

    store.apply_result(&action, &json!({"id": "job-1", "title": "B"}));
    let entity = store.get(Collection::Jobs, "job-1").unwrap();
    assert_eq!(entity.field("title"), Some(&json!("B")));
    assert!(!entity.is_optimistic);
    assert_eq!(entity.sync_status, SyncStatus::Synced);
}

#[test]
fn actions_without_local_effect_leave_store_alone() {
    let mut store = Store::new();
    assert!(!store.apply_action_optimistic(&Action::Logout));
    assert!(Collection::ALL.iter().all(|c| store.table(*c).is_empty()));
}
