//! Compositional reconstruction of finite-horizon flow maps.

use log::debug;
use rayon::prelude::*;

use gyre_core::{GridSpec, PositionField, StepSchedule};
use gyre_velocity::bilinear;

use crate::store::{FlowMapError, StepMapStore};

/// Tolerance for matching a step map's header times against the schedule.
fn times_agree(got: f64, expected: f64) -> bool {
    (got - expected).abs() <= 1e-9 * expected.abs().max(1.0)
}

/// Rebuild the flow map from schedule point `start_index` to the end of the
/// schedule by chaining step maps.
///
/// Starting from the uniform output grid seeded at
/// `schedule.time_of(start_index)`, each round loads the step map ending at
/// the next schedule point and bilinearly resamples its end-position field
/// at the current particle positions. A particle therefore never
/// re-integrates the velocity field: the one-step displacement computed in
/// Phase A is reused for every horizon that crosses it.
///
/// All times come from the shared [`StepSchedule`], so file lookups agree
/// bitwise with the names Phase A wrote. Out-of-domain particle positions
/// are clamped to the boundary for resampling and their cells are marked
/// escaped, permanently. With `start_index == schedule.count()` the result
/// is exactly the identity map.
///
/// # Errors
///
/// Fails if a step map is missing or malformed, or if its header grid or
/// times disagree with the schedule.
pub fn reconstruct(
    store: &StepMapStore,
    grid: GridSpec,
    schedule: &StepSchedule,
    start_index: usize,
) -> Result<PositionField, FlowMapError> {
    debug_assert!(start_index <= schedule.count());
    let mut field = PositionField::uniform(grid, schedule.time_of(start_index));

    for r in start_index..schedule.count() {
        let t_from = schedule.time_of(r);
        let t_to = schedule.time_of(r + 1);

        let map = store.read(t_to, grid)?;
        if !times_agree(map.t0, t_from) {
            return Err(FlowMapError::TimeMismatch {
                path: store.path_for(t_to),
                which: "t0",
                expected: t_from,
                got: map.t0,
            });
        }
        if !times_agree(map.t, t_to) {
            return Err(FlowMapError::TimeMismatch {
                path: store.path_for(t_to),
                which: "t",
                expected: t_to,
                got: map.t,
            });
        }

        let (positions, escaped) = field.cells_mut();
        positions
            .par_iter_mut()
            .zip_eq(escaped.par_iter_mut())
            .for_each(|(pos, esc)| {
                let [cx, cy] = grid.clamp(pos[0], pos[1]);
                let next = bilinear(&map.field, cx, cy);
                if !grid.contains(next[0], next[1]) {
                    *esc = true;
                }
                *pos = next;
            });
        field.set_current_time(t_to);
    }

    debug!(
        "composed {} step maps from t = {}, {} escaped",
        schedule.count() - start_index,
        field.origin_time(),
        field.escaped_count()
    );
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::Direction;
    use tempfile::TempDir;

    fn spec() -> GridSpec {
        GridSpec::new(5, 5, 0.0, 1.0, 0.0, 1.0).unwrap()
    }

    fn forward_store(dir: &TempDir) -> StepMapStore {
        StepMapStore::new(dir.path(), "t_", Direction::Forward, 0.25)
    }

    /// Write a step map whose end positions apply `f` to each seed node.
    fn write_map(
        store: &StepMapStore,
        t0: f64,
        t: f64,
        f: impl Fn(f64, f64) -> [f64; 2],
    ) {
        let g = spec();
        let mut map = PositionField::uniform(g, t0);
        {
            let (pos, _) = map.cells_mut();
            for cell in pos.iter_mut() {
                *cell = f(cell[0], cell[1]);
            }
        }
        map.set_current_time(t);
        store.write(&map).unwrap();
    }

    #[test]
    fn empty_tail_is_the_identity_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        let schedule = StepSchedule::new(5.0, 0.25, 0);

        let got = reconstruct(&store, spec(), &schedule, 0).unwrap();
        let identity = PositionField::uniform(spec(), 5.0);
        assert_eq!(got.positions(), identity.positions());
        assert_eq!(got.escaped_count(), 0);
        assert_eq!(got.current_time(), 5.0);
    }

    #[test]
    fn single_round_reproduces_the_step_map_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        write_map(&store, 0.0, 0.25, |x, y| [x * 0.5 + 0.1, y * 0.5 + 0.2]);

        let schedule = StepSchedule::new(0.0, 0.25, 1);
        let got = reconstruct(&store, spec(), &schedule, 0).unwrap();
        // Resampling at the seed nodes hits the stored values bit-for-bit.
        let map = store.read(0.25, spec()).unwrap();
        assert_eq!(got.positions(), map.field.values());
        assert_eq!(got.current_time(), 0.25);
    }

    /// Affine step maps are reproduced exactly by bilinear resampling, so a
    /// chain of contractions composes to the analytic power.
    #[test]
    fn chained_contractions_compose_to_the_power() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        // Each step pulls positions toward the domain center by 0.8.
        for r in 0..3 {
            let t0 = r as f64 * 0.25;
            write_map(&store, t0, t0 + 0.25, |x, y| {
                [0.5 + 0.8 * (x - 0.5), 0.5 + 0.8 * (y - 0.5)]
            });
        }

        let schedule = StepSchedule::new(0.0, 0.25, 3);
        let got = reconstruct(&store, spec(), &schedule, 0).unwrap();
        let g = spec();
        let factor = 0.8f64.powi(3);
        for i in 0..g.nx {
            for j in 0..g.ny {
                let [x0, y0] = g.node(i, j);
                let [x, y] = got.position(i, j);
                assert!(
                    (x - (0.5 + factor * (x0 - 0.5))).abs() < 1e-12,
                    "cell ({i},{j})"
                );
                assert!(
                    (y - (0.5 + factor * (y0 - 0.5))).abs() < 1e-12,
                    "cell ({i},{j})"
                );
            }
        }
        assert_eq!(got.escaped_count(), 0);
    }

    #[test]
    fn late_start_uses_only_the_tail_maps() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        // Only the second map exists; starting at index 1 never loads the first.
        write_map(&store, 0.25, 0.5, |x, y| {
            [0.5 + 0.5 * (x - 0.5), 0.5 + 0.5 * (y - 0.5)]
        });

        let schedule = StepSchedule::new(0.0, 0.25, 2);
        let got = reconstruct(&store, spec(), &schedule, 1).unwrap();
        assert_eq!(got.origin_time(), 0.25);
        assert_eq!(got.current_time(), 0.5);
        let [x, y] = got.position(0, 0);
        assert!((x - 0.25).abs() < 1e-12);
        assert!((y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn escapes_are_flagged_and_sticky_across_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        // Round 1 pushes everything right by 0.3; round 2 pushes it back.
        write_map(&store, 0.0, 0.25, |x, y| [x + 0.3, y]);
        write_map(&store, 0.25, 0.5, |x, y| [x - 0.3, y]);

        let schedule = StepSchedule::new(0.0, 0.25, 2);
        let got = reconstruct(&store, spec(), &schedule, 0).unwrap();
        // Seeds at x = 0.75 and x = 1.0 left the domain in round 1.
        for j in 0..5 {
            assert!(got.is_escaped(3, j));
            assert!(got.is_escaped(4, j));
            assert!(!got.is_escaped(0, j));
        }
    }

    #[test]
    fn missing_step_map_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        write_map(&store, 0.0, 0.25, |x, y| [x, y]);

        let schedule = StepSchedule::new(0.0, 0.25, 2);
        assert!(matches!(
            reconstruct(&store, spec(), &schedule, 0),
            Err(FlowMapError::Io { .. })
        ));
    }

    #[test]
    fn header_time_off_schedule_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = forward_store(&dir);
        // Map ends at the right time but claims the wrong origin.
        write_map(&store, 0.1, 0.25, |x, y| [x, y]);

        let schedule = StepSchedule::new(0.0, 0.25, 1);
        match reconstruct(&store, spec(), &schedule, 0) {
            Err(FlowMapError::TimeMismatch { which: "t0", .. }) => {}
            other => panic!("expected TimeMismatch on t0, got {other:?}"),
        }
    }

    #[test]
    fn backward_rounds_walk_down_the_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let store = StepMapStore::new(dir.path(), "t_", Direction::Backward, 0.25);
        // Backward step maps: seeded at t, advected to t - 0.25.
        let g = spec();
        for r in 0..2 {
            let t0 = 1.0 - r as f64 * 0.25;
            let mut map = PositionField::uniform(g, t0);
            {
                let (pos, _) = map.cells_mut();
                for cell in pos.iter_mut() {
                    cell[1] = (cell[1] + 0.1).min(1.0);
                }
            }
            map.set_current_time(t0 - 0.25);
            store.write(&map).unwrap();
        }

        let schedule = StepSchedule::new(1.0, -0.25, 2);
        let got = reconstruct(&store, g, &schedule, 0).unwrap();
        assert_eq!(got.current_time(), 0.5);
        // Two rounds of clamped upward shifts.
        let [_, y] = got.position(0, 0);
        assert!((y - 0.2).abs() < 1e-12);
    }
}
