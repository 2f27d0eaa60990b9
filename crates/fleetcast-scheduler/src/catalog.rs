//! Catalog expansion: static records → concrete job descriptors.
//!
//! Recomputed from a fresh snapshot on every pass, so edits to the record
//! files take effect on the next tick. Expansion is deterministic: devices
//! in sorted order, entries in declaration order, base times in listed
//! order — two passes over the same snapshot yield the same sequence.

use tracing::{debug, warn};

use fleetcast_core::store::Snapshot;
use fleetcast_core::types::{AlbumMeta, EngineKind, ScheduleEntry};
use fleetcast_core::{JobDescriptor, MinuteOfDay};

/// Expand every enabled (entry × base time) pair into a [`JobDescriptor`].
///
/// Configuration problems — unknown system key, malformed base time — skip
/// the offending record with a warning and never fail the pass.
pub fn iterate_jobs(snapshot: &Snapshot) -> Vec<JobDescriptor> {
    let mut jobs = Vec::new();

    for (device_id, profile) in &snapshot.devices {
        if !profile.enabled {
            debug!(device = %device_id, "device disabled, skipping");
            continue;
        }

        for entry in snapshot.entries.iter().filter(|e| &e.device_id == device_id) {
            let Some(table) = snapshot.systems.get(&entry.system_key) else {
                warn!(
                    device = %device_id,
                    system = %entry.system_key,
                    "unknown system key, entry skipped"
                );
                continue;
            };

            let item_count = resolve_item_count(entry, &snapshot.albums);

            for raw in table.times() {
                let base: MinuteOfDay = match raw.parse() {
                    Ok(t) => t,
                    Err(_) => {
                        warn!(system = %entry.system_key, value = %raw, "malformed base time, skipped");
                        continue;
                    }
                };
                let effective_time = base.add_minutes(profile.offset_minutes);

                jobs.push(JobDescriptor {
                    device_id: entry.device_id.clone(),
                    system_key: entry.system_key.clone(),
                    engine: entry.engine,
                    album_intro: entry.album_intro.clone(),
                    album_multi: entry.album_multi.clone(),
                    item_count,
                    platform: entry.platform.clone(),
                    platform_options: entry.platform_options.clone(),
                    base_time: base,
                    offset_minutes: profile.offset_minutes,
                    effective_time,
                });
            }
        }
    }

    jobs
}

/// The planning view for the operator surface: all jobs sorted by effective
/// time, then device, then system.
pub fn planning_table(snapshot: &Snapshot) -> Vec<JobDescriptor> {
    let mut jobs = iterate_jobs(snapshot);
    jobs.sort_by(|a, b| {
        (a.effective_time, &a.device_id, &a.system_key)
            .cmp(&(b.effective_time, &b.device_id, &b.system_key))
    });
    jobs
}

/// Resolve the item count for multi engines: the album's `count_per_post`
/// overrides the static count, and the result is clamped down to the
/// album's total size when that is known and smaller.
fn resolve_item_count(
    entry: &ScheduleEntry,
    albums: &std::collections::BTreeMap<String, AlbumMeta>,
) -> u32 {
    let mut count = entry.item_count;

    if !matches!(entry.engine, EngineKind::Multi | EngineKind::SingleThenMulti) {
        return count;
    }

    let album_name = entry.album_multi.as_ref().or(entry.album_intro.as_ref());
    let Some(meta) = album_name.and_then(|name| albums.get(name)) else {
        return count;
    };

    if let Some(per_post) = meta.count_per_post {
        if per_post > 0 {
            count = per_post;
        }
    }
    if let Some(total) = meta.total_size {
        if total > 0 && count > total {
            debug!(album = %meta.name, count, total, "clamping item count to album size");
            count = total;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcast_core::types::{DeviceProfile, TimeTable};
    use std::collections::BTreeMap;

    fn entry(device: &str, system: &str, engine: EngineKind) -> ScheduleEntry {
        ScheduleEntry {
            device_id: device.into(),
            system_key: system.into(),
            engine,
            album_intro: Some("openers".into()),
            album_multi: Some("catalog".into()),
            item_count: 11,
            platform: "WhatsApp".into(),
            platform_options: BTreeMap::new(),
        }
    }

    fn profile(enabled: bool, offset_minutes: i32) -> DeviceProfile {
        DeviceProfile {
            enabled,
            offset_minutes,
        }
    }

    fn snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.devices.insert("dev-a".into(), profile(true, 30));
        snap.systems.insert(
            "sys1".into(),
            TimeTable::List(vec!["08:00".into(), "23:50".into()]),
        );
        snap.entries.push(entry("dev-a", "sys1", EngineKind::Multi));
        snap
    }

    #[test]
    fn offsets_apply_and_wrap_past_midnight() {
        let jobs = iterate_jobs(&snapshot());
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].effective_time.to_string(), "08:30");
        assert_eq!(jobs[1].effective_time.to_string(), "00:20");
        assert_eq!(jobs[1].base_time.to_string(), "23:50");
    }

    #[test]
    fn expansion_is_deterministic() {
        let snap = snapshot();
        assert_eq!(iterate_jobs(&snap), iterate_jobs(&snap));
    }

    #[test]
    fn disabled_devices_are_skipped() {
        let mut snap = snapshot();
        snap.devices.insert("dev-a".into(), profile(false, 30));
        assert!(iterate_jobs(&snap).is_empty());
    }

    #[test]
    fn unknown_system_key_skips_the_entry() {
        let mut snap = snapshot();
        snap.entries.push(entry("dev-a", "missing", EngineKind::Single));
        // Only the two jobs from the known system remain.
        assert_eq!(iterate_jobs(&snap).len(), 2);
    }

    #[test]
    fn malformed_base_times_are_skipped() {
        let mut snap = snapshot();
        snap.systems.insert(
            "sys1".into(),
            TimeTable::List(vec!["08:00".into(), "covfefe".into()]),
        );
        let jobs = iterate_jobs(&snap);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].base_time.to_string(), "08:00");
    }

    #[test]
    fn album_count_per_post_overrides_static_count() {
        let mut snap = snapshot();
        snap.albums.insert(
            "catalog".into(),
            AlbumMeta {
                name: "catalog".into(),
                kind: None,
                total_size: Some(500),
                count_per_post: Some(7),
            },
        );
        assert_eq!(iterate_jobs(&snap)[0].item_count, 7);
    }

    #[test]
    fn count_is_clamped_to_album_size() {
        let mut snap = snapshot();
        snap.albums.insert(
            "catalog".into(),
            AlbumMeta {
                name: "catalog".into(),
                kind: None,
                total_size: Some(4),
                count_per_post: None,
            },
        );
        assert_eq!(iterate_jobs(&snap)[0].item_count, 4);
    }

    #[test]
    fn single_engine_ignores_album_count() {
        let mut snap = snapshot();
        snap.entries[0].engine = EngineKind::Single;
        snap.albums.insert(
            "catalog".into(),
            AlbumMeta {
                name: "catalog".into(),
                kind: None,
                total_size: Some(4),
                count_per_post: Some(7),
            },
        );
        assert_eq!(iterate_jobs(&snap)[0].item_count, 11);
    }

    #[test]
    fn planning_table_sorts_by_effective_time_then_device() {
        let mut snap = snapshot();
        snap.devices.insert("dev-b".into(), profile(true, 0));
        snap.entries.push(entry("dev-b", "sys1", EngineKind::Single));
        let rows = planning_table(&snap);
        let order: Vec<String> = rows
            .iter()
            .map(|j| format!("{} {}", j.effective_time, j.device_id))
            .collect();
        assert_eq!(
            order,
            ["00:20 dev-a", "08:00 dev-b", "08:30 dev-a", "23:50 dev-b"]
        );
    }
}
