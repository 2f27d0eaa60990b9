//! End-to-end manual catch-up: records on disk, a real window ending at the
//! actual wall clock, and a recording dispatcher standing in for the worker.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Local;

use fleetcast_core::types::{ClockMode, ClockState};
use fleetcast_core::{JobDescriptor, MinuteOfDay, RecordStore};
use fleetcast_runner::Dispatch;
use fleetcast_scheduler::{wall_minute, CatchupReplayer, FireGuard, FireKey};

struct RecordingDispatcher {
    seen: Mutex<Vec<(String, String, Option<String>)>>,
}

impl RecordingDispatcher {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Dispatch for RecordingDispatcher {
    async fn dispatch(&self, job: &JobDescriptor, logical: Option<MinuteOfDay>) -> i32 {
        self.seen.lock().unwrap().push((
            job.device_id.clone(),
            job.effective_time.to_string(),
            logical.map(|m| m.to_string()),
        ));
        0
    }
}

static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

fn temp_store() -> RecordStore {
    let dir = std::env::temp_dir().join(format!(
        "fleetcast-catchup-test-{}-{}",
        std::process::id(),
        DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    RecordStore::new(dir)
}

fn write_records(store: &RecordStore, base_times: &[MinuteOfDay]) {
    let times: Vec<String> = base_times.iter().map(|t| t.to_string()).collect();
    std::fs::write(
        store.dir().join("devices.json"),
        serde_json::json!({"devices": {"dev-a": {"enabled": true, "offset_minutes": 0}}})
            .to_string(),
    )
    .unwrap();
    std::fs::write(
        store.dir().join("timetables.json"),
        serde_json::json!({"systems": {"sys1": times}}).to_string(),
    )
    .unwrap();
    std::fs::write(
        store.dir().join("schedule.json"),
        serde_json::json!({
            "entries": [{"device_id": "dev-a", "system_key": "sys1", "engine": "single",
                         "album_intro": "openers"}]
        })
        .to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn replay_runs_window_jobs_once_and_returns_to_auto() {
    let store = temp_store();
    let now = wall_minute(Local::now());
    let start = now.add_minutes(-120);
    let inside = now.add_minutes(-60);
    let before_window = now.add_minutes(-200);

    write_records(&store, &[inside, before_window]);
    store
        .write_clock_state(&ClockState::manual(start.to_string()))
        .unwrap();

    let dispatcher = RecordingDispatcher::new();
    let replayer = CatchupReplayer::new(&store, &dispatcher);
    let mut guard = FireGuard::new();

    let outcome = replayer.replay(start, &mut guard).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.dispatched, 1);

    let seen = dispatcher.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, inside.to_string());
    assert_eq!(seen[0].2.as_deref(), Some(inside.to_string().as_str()));
    drop(seen);

    // One-shot: the clock control record is back to auto.
    assert_eq!(store.load_clock_state().mode, ClockMode::Auto);
    // And the live loop's guard already knows about the replayed key.
    assert!(!guard.should_fire(&FireKey::new(inside, "dev-a", "sys1")));
}

#[tokio::test]
async fn replay_aborts_when_the_epoch_no_longer_matches() {
    let store = temp_store();
    let now = wall_minute(Local::now());
    let inside = now.add_minutes(-30);
    write_records(&store, &[inside]);

    // The operator has since moved the start time: the persisted state does
    // not match the epoch this replay was started for.
    store
        .write_clock_state(&ClockState::manual(now.add_minutes(-60).to_string()))
        .unwrap();

    let dispatcher = RecordingDispatcher::new();
    let replayer = CatchupReplayer::new(&store, &dispatcher);
    let mut guard = FireGuard::new();

    let stale_epoch = now.add_minutes(-120);
    let outcome = replayer.replay(stale_epoch, &mut guard).await.unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.dispatched, 0);
    assert!(dispatcher.seen.lock().unwrap().is_empty());
    // The clock state is left for the next replay to pick up.
    assert_eq!(store.load_clock_state().mode, ClockMode::Manual);
}
