//! Run configuration: strict ingest and validation.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use gyre_core::{Direction, GridError, GridSpec, StepSchedule};

/// Relative tolerance for deciding the cadence divides the window integrally.
const CADENCE_TOL: f64 = 1e-9;

/// The complete configuration of one FTLE run.
///
/// Ingested from a TOML document. Every key is required and unknown keys are
/// rejected, so a typo'd setting fails the run before any compute instead of
/// silently falling back to a default.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Lower x bound of the domain.
    pub x_min: f64,
    /// Upper x bound of the domain.
    pub x_max: f64,
    /// Lower y bound of the domain.
    pub y_min: f64,
    /// Upper y bound of the domain.
    pub y_max: f64,
    /// Output-grid node count along x.
    pub nx: usize,
    /// Output-grid node count along y.
    pub ny: usize,
    /// Velocity-grid node count along x.
    pub data_nx: usize,
    /// Velocity-grid node count along y.
    pub data_ny: usize,
    /// Start of the temporal window.
    pub t_min: f64,
    /// End of the temporal window.
    pub t_max: f64,
    /// Snapshot cadence; must divide `t_max - t_min` integrally.
    pub data_delta_t: f64,
    /// Number of output timesteps; the output step is the window over this.
    pub steps: usize,
    /// Prefix used in every generated filename.
    pub file_prefix: String,
    /// `"forward"` or `"backward"`.
    pub direction: String,
}

/// Errors detected while loading or validating a [`RunConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// File being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The document does not parse, has unknown keys, or misses keys.
    Parse {
        /// The parser's description of the problem.
        detail: String,
    },
    /// A grid is structurally invalid.
    Grid(GridError),
    /// The temporal window is empty, inverted, or non-finite.
    BadWindow {
        /// Configured window start.
        t_min: f64,
        /// Configured window end.
        t_max: f64,
    },
    /// The snapshot cadence is zero, negative, or non-finite.
    BadCadence {
        /// The offending cadence.
        value: f64,
    },
    /// The cadence does not divide the temporal window integrally.
    CadenceMisfit {
        /// Length of the temporal window.
        window: f64,
        /// Configured cadence.
        cadence: f64,
    },
    /// `file_prefix` is empty.
    EmptyFilePrefix,
    /// `direction` is not `forward` or `backward`.
    BadDirection {
        /// The offending value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "config {}: {source}", path.display()),
            Self::Parse { detail } => write!(f, "config: {detail}"),
            Self::Grid(e) => write!(f, "config: {e}"),
            Self::BadWindow { t_min, t_max } => {
                write!(f, "config: temporal window [{t_min}, {t_max}] is empty or inverted")
            }
            Self::BadCadence { value } => {
                write!(f, "config: data_delta_t must be finite and positive, got {value}")
            }
            Self::CadenceMisfit { window, cadence } => write!(
                f,
                "config: data_delta_t = {cadence} does not divide the window {window} integrally"
            ),
            Self::EmptyFilePrefix => write!(f, "config: file_prefix must not be empty"),
            Self::BadDirection { value } => {
                write!(f, "config: direction must be \"forward\" or \"backward\", got \"{value}\"")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl RunConfig {
    /// Load and parse a configuration file. Does not validate; call
    /// [`validate`](Self::validate) before running.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration document from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })
    }

    /// Check every structural invariant. All failures are fatal and
    /// reported before any compute starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output_grid()?;
        self.data_grid()?;

        if !(self.t_min.is_finite() && self.t_max.is_finite()) || self.t_min >= self.t_max {
            return Err(ConfigError::BadWindow {
                t_min: self.t_min,
                t_max: self.t_max,
            });
        }
        if !self.data_delta_t.is_finite() || self.data_delta_t <= 0.0 {
            return Err(ConfigError::BadCadence {
                value: self.data_delta_t,
            });
        }
        let window = self.window();
        let intervals = window / self.data_delta_t;
        let nearest = intervals.round();
        if nearest < 1.0 || (intervals - nearest).abs() > CADENCE_TOL * nearest {
            return Err(ConfigError::CadenceMisfit {
                window,
                cadence: self.data_delta_t,
            });
        }
        if self.file_prefix.is_empty() {
            return Err(ConfigError::EmptyFilePrefix);
        }
        self.parsed_direction()?;
        Ok(())
    }

    /// The output grid over the configured domain.
    pub fn output_grid(&self) -> Result<GridSpec, ConfigError> {
        Ok(GridSpec::new(
            self.nx, self.ny, self.x_min, self.x_max, self.y_min, self.y_max,
        )?)
    }

    /// The velocity data grid over the same domain.
    pub fn data_grid(&self) -> Result<GridSpec, ConfigError> {
        Ok(GridSpec::new(
            self.data_nx,
            self.data_ny,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
        )?)
    }

    /// The configured integration direction.
    pub fn parsed_direction(&self) -> Result<Direction, ConfigError> {
        self.direction
            .parse()
            .map_err(|_| ConfigError::BadDirection {
                value: self.direction.clone(),
            })
    }

    /// Length of the temporal window.
    pub fn window(&self) -> f64 {
        self.t_max - self.t_min
    }

    /// The unsigned output step. Callers must guard `steps > 0`.
    pub fn dt(&self) -> f64 {
        self.window() / self.steps as f64
    }

    /// Number of snapshots the run expects on disk.
    pub fn snapshot_count(&self) -> usize {
        (self.window() / self.data_delta_t).round() as usize + 1
    }

    /// The output-step timetable for the given direction.
    ///
    /// Forward schedules march from `t_min`, backward from `t_max`. A run
    /// with zero steps gets an empty schedule anchored at the start time.
    pub fn schedule(&self, direction: Direction) -> StepSchedule {
        let t_start = match direction {
            Direction::Forward => self.t_min,
            Direction::Backward => self.t_max,
        };
        if self.steps == 0 {
            return StepSchedule::new(t_start, 0.0, 0);
        }
        StepSchedule::new(t_start, direction.sign() * self.dt(), self.steps)
    }
}
