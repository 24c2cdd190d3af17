//! The two-phase orchestrator.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use gyre_core::{format_time, time_decimals, Direction, PositionField};
use gyre_flow::{advect_step, reconstruct, FlowMapError, StepMapStore};
use gyre_ftle::{ftle_field, write_ftle};
use gyre_velocity::{SnapshotCache, SnapshotError};

use crate::config::{ConfigError, RunConfig};
use crate::paths::RunPaths;

/// Fatal errors from a run.
///
/// Every variant formats as a single line suitable for the error stream;
/// numerical out-of-bounds events are not errors and surface only as
/// sentinel cells in the output.
#[derive(Debug)]
pub enum EngineError {
    /// The configuration is missing, malformed, or inconsistent.
    Config(ConfigError),
    /// A velocity snapshot could not be loaded.
    Snapshot(SnapshotError),
    /// A step flow map could not be written or read back.
    FlowMap(FlowMapError),
    /// An output file or directory could not be written.
    Output {
        /// Path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Snapshot(e) => write!(f, "{e}"),
            Self::FlowMap(e) => write!(f, "{e}"),
            Self::Output { path, source } => {
                write!(f, "output {}: {source}", path.display())
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Snapshot(e) => Some(e),
            Self::FlowMap(e) => Some(e),
            Self::Output { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SnapshotError> for EngineError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

impl From<FlowMapError> for EngineError {
    fn from(e: FlowMapError) -> Self {
        Self::FlowMap(e)
    }
}

/// A progress event, reported once per file the run writes.
#[derive(Clone, Copy, Debug)]
pub enum Progress<'a> {
    /// Phase A wrote the step map ending at `t`.
    StepMapWritten {
        /// Zero-based step index.
        index: usize,
        /// Total number of steps.
        total: usize,
        /// End time of the step.
        t: f64,
        /// File just written.
        path: &'a Path,
    },
    /// Phase B wrote the FTLE field originating at `t_origin`.
    FtleWritten {
        /// Zero-based output index.
        index: usize,
        /// Total number of FTLE outputs.
        total: usize,
        /// Origin time of the composed horizon.
        t_origin: f64,
        /// File just written.
        path: &'a Path,
    },
}

/// What a completed run produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Step flow maps written in Phase A.
    pub step_maps: usize,
    /// FTLE fields written in Phase B.
    pub ftle_fields: usize,
}

/// Execute a run, discarding progress events.
pub fn run(config: &RunConfig, paths: &RunPaths) -> Result<RunSummary, EngineError> {
    run_with(config, paths, |_| {})
}

/// Execute a run, reporting a [`Progress`] event per file written.
///
/// Phase A marches the uniform output grid across the window one output
/// step at a time, resetting to uniform between steps, and persists each
/// end-position field. Phase B slides the origin time back from the far end
/// of the window, composing `1, 2, ..., steps` step maps and writing one
/// FTLE field each. A run with `steps = 0` writes the single zero-horizon
/// FTLE field (identically zero) so it still produces output.
///
/// # Errors
///
/// Any configuration, I/O, or format failure aborts the run; no partial
/// result is recovered.
pub fn run_with<F: FnMut(Progress<'_>)>(
    config: &RunConfig,
    paths: &RunPaths,
    mut on_progress: F,
) -> Result<RunSummary, EngineError> {
    config.validate()?;
    let direction = config.parsed_direction()?;
    let out_spec = config.output_grid()?;
    let data_spec = config.data_grid()?;
    let schedule = config.schedule(direction);
    let decimals = time_decimals(config.data_delta_t);

    for dir in [&paths.step_maps_dir, &paths.ftle_dir] {
        fs::create_dir_all(dir).map_err(|source| EngineError::Output {
            path: dir.clone(),
            source,
        })?;
    }

    if schedule.count() > 0 && config.dt() < config.data_delta_t {
        warn!(
            "output step {} is finer than the data cadence {}; \
             substeps use temporally interpolated velocity",
            config.dt(),
            config.data_delta_t
        );
    }

    let store = StepMapStore::new(
        &paths.step_maps_dir,
        &config.file_prefix,
        direction,
        config.data_delta_t,
    );

    // Phase A: one step map per output step, each seeded from the uniform
    // grid at its own start time.
    let mut cache = SnapshotCache::new(
        &paths.data_dir,
        &config.file_prefix,
        data_spec,
        config.t_min,
        config.data_delta_t,
        config.snapshot_count(),
    );
    let mut field = PositionField::uniform(out_spec, schedule.t_start());
    for s in 0..schedule.count() {
        let t_s = schedule.time_of(s);
        let t_next = schedule.time_of(s + 1);

        field.reset_to_uniform(t_s);
        cache.ensure_span(t_s, t_next)?;
        let sampler = cache.sampler();
        advect_step(&mut field, &sampler, t_next - t_s, config.data_delta_t);
        // Stamp the schedule's exact end time so the filename Phase B looks
        // up matches bitwise.
        field.set_current_time(t_next);

        let escaped = field.escaped_count();
        if escaped > 0 {
            warn!("step {s}: {escaped} particles left the domain");
        }

        let path = store.write(&field)?;
        info!("wrote step map {} of {}", s + 1, schedule.count());
        on_progress(Progress::StepMapWritten {
            index: s,
            total: schedule.count(),
            t: t_next,
            path: &path,
        });
    }

    // Phase B: compose and emit, shortest horizon first.
    let mut ftle_fields = 0;
    if schedule.count() == 0 {
        // Zero-horizon run: the flow map is the identity at the window's
        // far end and the FTLE field is identically zero.
        let t_hold = match direction {
            Direction::Forward => config.t_max,
            Direction::Backward => config.t_min,
        };
        let map = PositionField::uniform(out_spec, t_hold);
        let path = write_output(paths, config, direction, &map, decimals)?;
        on_progress(Progress::FtleWritten {
            index: 0,
            total: 1,
            t_origin: t_hold,
            path: &path,
        });
        ftle_fields = 1;
    } else {
        for k in 1..=schedule.count() {
            let start_index = schedule.count() - k;
            let map = reconstruct(&store, out_spec, &schedule, start_index)?;
            let path = write_output(paths, config, direction, &map, decimals)?;
            info!("wrote FTLE field {k} of {}", schedule.count());
            on_progress(Progress::FtleWritten {
                index: k - 1,
                total: schedule.count(),
                t_origin: map.origin_time(),
                path: &path,
            });
            ftle_fields += 1;
        }
    }

    Ok(RunSummary {
        step_maps: schedule.count(),
        ftle_fields,
    })
}

/// Compute the FTLE field of a composed map and write it to its output file.
fn write_output(
    paths: &RunPaths,
    config: &RunConfig,
    direction: Direction,
    map: &PositionField,
    decimals: usize,
) -> Result<PathBuf, EngineError> {
    let t_origin = map.origin_time();
    let t_final = map.current_time();
    let ftle = ftle_field(map);

    // Forward outputs are named origin-final; backward outputs final-origin,
    // so the earlier time always comes first.
    let (t_a, t_b) = match direction {
        Direction::Forward => (t_origin, t_final),
        Direction::Backward => (t_final, t_origin),
    };
    let name = format!(
        "{}{}{}-{}.txt",
        config.file_prefix,
        direction.file_tag(),
        format_time(t_a, decimals),
        format_time(t_b, decimals),
    );
    let path = paths.ftle_dir.join(name);
    write_ftle(&path, &ftle, t_origin, t_final).map_err(|source| EngineError::Output {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
