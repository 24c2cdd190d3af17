//! Integration direction and filename time stamps.

use std::fmt;
use std::str::FromStr;

/// Maximum number of decimals probed by [`time_decimals`].
const MAX_DECIMALS: usize = 12;

/// Tolerance for deciding that a scaled cadence is integral.
const INTEGRAL_TOL: f64 = 1e-9;

/// Direction of the Lagrangian integration.
///
/// Forward runs march from `t_min` to `t_max` and expose attracting
/// structures; backward runs march the other way and expose repelling ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Integrate from `t_min` towards `t_max`.
    Forward,
    /// Integrate from `t_max` towards `t_min`.
    Backward,
}

impl Direction {
    /// Sign of the output step: `+1.0` forward, `-1.0` backward.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    /// Filename tag distinguishing forward from backward artifacts.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Self::Forward => "positive_",
            Self::Backward => "negative_",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => Err(format!(
                "direction must be \"forward\" or \"backward\", got \"{other}\""
            )),
        }
    }
}

/// The output-step timetable of a run.
///
/// Phase A writes one step map per schedule interval and Phase B looks the
/// same files up again; both sides must agree on the time stamps *bitwise*,
/// because step maps are addressed by formatted end time. The schedule is
/// the single place step times are computed: always `t_start + index * step`
/// from the integer index, never accumulated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepSchedule {
    t_start: f64,
    step: f64,
    count: usize,
}

impl StepSchedule {
    /// A schedule of `count` output steps of signed size `step` from
    /// `t_start`.
    pub fn new(t_start: f64, step: f64, count: usize) -> Self {
        debug_assert!(step != 0.0 || count == 0);
        Self {
            t_start,
            step,
            count,
        }
    }

    /// Number of output steps.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Signed output step size.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Time of schedule point `index` (`0..=count`).
    pub fn time_of(&self, index: usize) -> f64 {
        self.t_start + index as f64 * self.step
    }

    /// Time the integration starts from.
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    /// Time the integration ends at (`time_of(count)`).
    pub fn t_end(&self) -> f64 {
        self.time_of(self.count)
    }
}

/// Number of decimals needed to print times at the cadence `dt` exactly.
///
/// Returns the smallest `p <= 12` such that `dt * 10^p` is integral within
/// `1e-9`, so every snapshot / step-map / FTLE filename carries the same
/// fixed-precision stamp and file lookups reduce to string equality.
pub fn time_decimals(dt: f64) -> usize {
    let mut scaled = dt;
    for p in 0..MAX_DECIMALS {
        if (scaled - scaled.round()).abs() < INTEGRAL_TOL {
            return p;
        }
        scaled *= 10.0;
    }
    MAX_DECIMALS
}

/// Fixed-precision time stamp used in generated filenames.
pub fn format_time(t: f64, decimals: usize) -> String {
    format!("{t:.decimals$}")
}
