//! Lazy, bounded residency of velocity snapshots.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use gyre_core::{format_time, time_decimals, GridSpec};

use crate::sampler::VelocitySampler;
use crate::snapshot::{read_snapshot, Snapshot, SnapshotError};

/// Owns the snapshots bracketing the current integration span.
///
/// Snapshots are loaded lazily from `{dir}/{file_prefix}{t:.P}.txt` and held
/// in an insertion-ordered window keyed by snapshot index. Before each
/// advection step the orchestrator calls [`ensure_span`](Self::ensure_span);
/// snapshots behind the span are evicted, so residency stays bounded by the
/// number of data intervals one output step crosses, plus one.
pub struct SnapshotCache {
    dir: PathBuf,
    file_prefix: String,
    decimals: usize,
    data_spec: GridSpec,
    t_min: f64,
    dt_data: f64,
    count: usize,
    window: IndexMap<usize, Snapshot>,
}

impl SnapshotCache {
    /// Create an empty cache for `count` snapshots at cadence `dt_data`
    /// starting at `t_min`. `count` must be at least 2 so a bracket always
    /// exists.
    pub fn new(
        dir: &Path,
        file_prefix: &str,
        data_spec: GridSpec,
        t_min: f64,
        dt_data: f64,
        count: usize,
    ) -> Self {
        debug_assert!(count >= 2, "need at least two snapshots to bracket");
        Self {
            dir: dir.to_path_buf(),
            file_prefix: file_prefix.to_string(),
            decimals: time_decimals(dt_data),
            data_spec,
            t_min,
            dt_data,
            count,
            window: IndexMap::new(),
        }
    }

    /// Snapshot time for index `k`.
    pub fn time_of(&self, k: usize) -> f64 {
        self.t_min + k as f64 * self.dt_data
    }

    /// File path for snapshot index `k`.
    pub fn path_of(&self, k: usize) -> PathBuf {
        let stamp = format_time(self.time_of(k), self.decimals);
        self.dir.join(format!("{}{stamp}.txt", self.file_prefix))
    }

    /// Index of the snapshot at or just before `t`, clamped so the bracket
    /// `[k, k + 1]` always exists.
    fn bracket_index(&self, t: f64) -> usize {
        let rel = (t - self.t_min) / self.dt_data;
        (rel.floor().max(0.0) as usize).min(self.count - 2)
    }

    /// Make every snapshot bracketing `[min(t_a, t_b), max(t_a, t_b)]`
    /// resident, evicting snapshots outside that range.
    ///
    /// # Errors
    ///
    /// Fails if a snapshot file cannot be read, its grid does not match the
    /// configured data grid, or its header time disagrees with the cadence.
    pub fn ensure_span(&mut self, t_a: f64, t_b: f64) -> Result<(), SnapshotError> {
        let lo = self.bracket_index(t_a.min(t_b));
        let hi = self.bracket_index(t_a.max(t_b)) + 1;

        self.window.retain(|&k, _| k >= lo && k <= hi);

        for k in lo..=hi {
            if self.window.contains_key(&k) {
                continue;
            }
            let path = self.path_of(k);
            let snap = read_snapshot(&path, self.data_spec)?;
            let expected = self.time_of(k);
            if (snap.t - expected).abs() > 1e-9 * expected.abs().max(1.0) {
                return Err(SnapshotError::TimeMismatch {
                    path,
                    expected,
                    got: snap.t,
                });
            }
            debug!("loaded snapshot {k} (t = {})", snap.t);
            self.window.insert(k, snap);
        }
        // Keep the window sorted by index so the sampler sees a contiguous run.
        self.window.sort_unstable_keys();
        Ok(())
    }

    /// Number of resident snapshots.
    pub fn resident(&self) -> usize {
        self.window.len()
    }

    /// Borrow the resident window as a sampler.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two snapshots are resident; callers must
    /// [`ensure_span`](Self::ensure_span) first. This indicates a driver
    /// bug, not a data error.
    pub fn sampler(&self) -> VelocitySampler<'_> {
        assert!(
            self.window.len() >= 2,
            "sampler requested before ensure_span made a bracket resident"
        );
        let first = *self.window.keys().next().expect("non-empty window");
        let snaps: Vec<&Snapshot> = self.window.values().collect();
        VelocitySampler::new(snaps, self.time_of(first), self.dt_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::write_snapshot;
    use gyre_core::VectorField;
    use tempfile::TempDir;

    fn data_spec() -> GridSpec {
        GridSpec::new(4, 4, 0.0, 1.0, 0.0, 1.0).unwrap()
    }

    /// Write `count` snapshots whose u component equals the snapshot time.
    fn seed_snapshots(count: usize, dt: f64) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for k in 0..count {
            let t = k as f64 * dt;
            let mut field = VectorField::zeros(data_spec());
            for cell in field.values_mut() {
                *cell = [t, 0.0];
            }
            let stamp = format_time(t, time_decimals(dt));
            let path = dir.path().join(format!("vel_{stamp}.txt"));
            write_snapshot(&path, t, &field).unwrap();
        }
        dir
    }

    fn cache(dir: &TempDir, count: usize, dt: f64) -> SnapshotCache {
        SnapshotCache::new(dir.path(), "vel_", data_spec(), 0.0, dt, count)
    }

    #[test]
    fn loads_exactly_the_bracketing_snapshots() {
        let dir = seed_snapshots(6, 0.5);
        let mut cache = cache(&dir, 6, 0.5);

        cache.ensure_span(0.6, 0.9).unwrap();
        assert_eq!(cache.resident(), 2); // indices 1, 2

        let [u, _] = cache.sampler().sample(0.5, 0.5, 0.75);
        assert!((u - 0.75).abs() < 1e-12);
    }

    #[test]
    fn advancing_the_span_evicts_stale_snapshots() {
        let dir = seed_snapshots(6, 0.5);
        let mut cache = cache(&dir, 6, 0.5);

        cache.ensure_span(0.0, 1.0).unwrap();
        assert_eq!(cache.resident(), 4); // indices 0..=3 (t = 1.0 opens bracket [2, 3])

        cache.ensure_span(2.0, 2.5).unwrap();
        assert_eq!(cache.resident(), 2); // indices 4, 5 only
        let [u, _] = cache.sampler().sample(0.5, 0.5, 2.25);
        assert!((u - 2.25).abs() < 1e-12);
    }

    #[test]
    fn span_wider_than_one_interval_is_fully_resident() {
        let dir = seed_snapshots(6, 0.5);
        let mut cache = cache(&dir, 6, 0.5);

        // An output step of 1.5 crosses three data intervals.
        cache.ensure_span(0.25, 1.75).unwrap();
        assert_eq!(cache.resident(), 5); // indices 0..=4
    }

    #[test]
    fn missing_snapshot_file_fails() {
        let dir = seed_snapshots(2, 0.5);
        let mut cache = cache(&dir, 4, 0.5);
        assert!(matches!(
            cache.ensure_span(1.2, 1.4),
            Err(SnapshotError::Io { .. })
        ));
    }

    #[test]
    fn header_time_off_cadence_fails() {
        let dir = seed_snapshots(3, 0.5);
        // Overwrite snapshot 1 with a wrong header time.
        let field = VectorField::zeros(data_spec());
        let path = dir.path().join("vel_0.5.txt");
        write_snapshot(&path, 0.7, &field).unwrap();

        let mut cache = cache(&dir, 3, 0.5);
        match cache.ensure_span(0.4, 0.6) {
            Err(SnapshotError::TimeMismatch { expected, got, .. }) => {
                assert_eq!(expected, 0.5);
                assert_eq!(got, 0.7);
            }
            other => panic!("expected TimeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn backward_span_arguments_are_order_independent() {
        let dir = seed_snapshots(6, 0.5);
        let mut cache = cache(&dir, 6, 0.5);
        cache.ensure_span(1.5, 0.5).unwrap();
        assert_eq!(cache.resident(), 4); // indices 1..=4 (t = 1.5 opens bracket [3, 4])
    }
}
