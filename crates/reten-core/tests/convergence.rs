//! Multi-client convergence: independent lifecycle managers and views over
//! one shared store must agree after each propagation cycle, and confirm
//! idempotence must hold under racing writers.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use reten_core::store::ReportStore;
use reten_core::{
    Category, ClientView, Lifecycle, SqliteReportStore, SubmitRequest,
};
use std::sync::Arc;
use std::thread;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
        .single()
        .expect("valid ts")
}

fn client(store: &Arc<SqliteReportStore>) -> (Lifecycle, ClientView) {
    let as_store: Arc<dyn ReportStore> = Arc::clone(store) as Arc<dyn ReportStore>;
    (
        Lifecycle::new(Arc::clone(&as_store)),
        ClientView::connect(as_store),
    )
}

fn request(token: &str) -> SubmitRequest {
    SubmitRequest {
        lat: 4.711,
        lng: -74.0721,
        category: Category::VehicularControl,
        description: None,
        author_token: token.to_string(),
    }
}

#[test]
fn submission_reaches_every_connected_view() {
    let store = Arc::new(SqliteReportStore::open_in_memory().expect("open store"));
    let (lifecycle_a, mut view_a) = client(&store);
    let (_lifecycle_b, mut view_b) = client(&store);

    assert!(view_a.visible(t0()).expect("initial a").is_empty());
    assert!(view_b.visible(t0()).expect("initial b").is_empty());

    let report = lifecycle_a.submit(request("device-a"), t0()).expect("submit");

    // One propagation cycle: the change signal marks both views dirty and
    // the next read re-queries.
    assert_eq!(view_a.visible(t0()).expect("read a").len(), 1);
    let seen_by_b = view_b.visible(t0()).expect("read b");
    assert_eq!(seen_by_b.len(), 1);
    assert_eq!(seen_by_b[0].id, report.id);
}

#[test]
fn cross_client_confirms_converge_on_the_same_count() {
    let store = Arc::new(SqliteReportStore::open_in_memory().expect("open store"));
    let (lifecycle_a, mut view_a) = client(&store);
    let (lifecycle_b, _view_b) = client(&store);

    let report = lifecycle_a.submit(request("device-a"), t0()).expect("submit");
    lifecycle_b
        .confirm(&report.id, "device-b", t0())
        .expect("b confirms");
    lifecycle_a
        .confirm(&report.id, "device-c", t0())
        .expect("c confirms via a");

    let seen = view_a.visible(t0()).expect("read a");
    assert_eq!(seen[0].confirmations, 2);
    assert_eq!(seen[0].voter_tokens.len(), 2);
}

#[test]
fn racing_confirms_from_one_token_count_once() {
    let store = Arc::new(SqliteReportStore::open_in_memory().expect("open store"));
    let (lifecycle, _view) = client(&store);
    let report = lifecycle.submit(request("device-a"), t0()).expect("submit");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = report.id.clone();
            thread::spawn(move || {
                let lifecycle = Lifecycle::new(store as Arc<dyn ReportStore>);
                lifecycle
                    .confirm(&id, "same-device", t0())
                    .expect("confirm")
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread join"))
        .collect();

    let applied = outcomes.iter().filter(|o| !o.is_noop()).count();
    assert_eq!(applied, 1, "exactly one racing confirm may count");

    let final_state = lifecycle
        .store()
        .fetch(&report.id)
        .expect("fetch")
        .expect("report exists");
    assert_eq!(final_state.confirmations, 1);
    assert_eq!(final_state.voter_tokens.len(), 1);
}

#[test]
fn racing_confirms_from_distinct_tokens_all_count() {
    let store = Arc::new(SqliteReportStore::open_in_memory().expect("open store"));
    let (lifecycle, _view) = client(&store);
    let report = lifecycle.submit(request("device-a"), t0()).expect("submit");

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let store = Arc::clone(&store);
            let id = report.id.clone();
            thread::spawn(move || {
                let lifecycle = Lifecycle::new(store as Arc<dyn ReportStore>);
                lifecycle
                    .confirm(&id, &format!("device-{i}"), t0())
                    .expect("confirm")
            })
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().expect("thread join").is_noop());
    }

    let final_state = lifecycle
        .store()
        .fetch(&report.id)
        .expect("fetch")
        .expect("report exists");
    assert_eq!(final_state.confirmations, 6);
    assert_eq!(final_state.voter_tokens.len(), 6);
}

#[test]
fn view_teardown_does_not_disturb_other_clients() {
    let store = Arc::new(SqliteReportStore::open_in_memory().expect("open store"));
    let (lifecycle_a, mut view_a) = client(&store);
    let (_lifecycle_b, view_b) = client(&store);

    lifecycle_a.submit(request("device-a"), t0()).expect("submit");
    drop(view_b);

    lifecycle_a
        .submit(request("device-a"), t0() + Duration::minutes(1))
        .expect("submit after teardown");
    assert_eq!(
        view_a
            .visible(t0() + Duration::minutes(1))
            .expect("read a")
            .len(),
        2
    );
}
