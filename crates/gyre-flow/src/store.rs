//! Persistence of step flow maps.
//!
//! One binary file per step, all integers and floats little-endian:
//! magic `b"GFMP"`, format version `u8`, `nx: u32`, `ny: u32`, `t0: f64`,
//! `t: f64`, then `nx * ny` records `(x: f64, y: f64)` in x-major order.
//! Files are named by the step's **end** time at the cadence precision, so
//! the reconstructor can address them without an index.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use gyre_core::{format_time, time_decimals, Direction, GridSpec, PositionField, VectorField};

/// Magic bytes at the start of every step-map file.
pub const MAGIC: [u8; 4] = *b"GFMP";

/// Current step-map format version.
pub const FORMAT_VERSION: u8 = 1;

/// Header length in bytes: magic + version + nx + ny + t0 + t.
const HEADER_LEN: usize = 4 + 1 + 4 + 4 + 8 + 8;

/// Bytes per cell record: two little-endian `f64`.
const RECORD_LEN: usize = 16;

/// A step flow map read back from disk.
///
/// The end-position field is exposed as a [`VectorField`] over the uniform
/// output grid: the value at node `(i, j)` is the end position of the
/// particle seeded there at `t0`. Escape masks are not persisted; the
/// reconstructor re-derives them from the composed positions.
#[derive(Clone, Debug, PartialEq)]
pub struct StepMap {
    /// Time at which the map's particles were seeded on the uniform grid.
    pub t0: f64,
    /// Time the particles were advected to (the file's name key).
    pub t: f64,
    /// End positions over the output grid.
    pub field: VectorField,
}

/// Errors from step-map persistence.
#[derive(Debug)]
pub enum FlowMapError {
    /// An I/O error on the named file.
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file does not start with the `b"GFMP"` magic bytes.
    BadMagic {
        /// File being read.
        path: PathBuf,
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// File being read.
        path: PathBuf,
        /// Version byte found in the file.
        found: u8,
    },
    /// The file is shorter or longer than its header implies.
    Truncated {
        /// File being read.
        path: PathBuf,
        /// Expected total length in bytes.
        expected: usize,
        /// Actual file length in bytes.
        got: usize,
    },
    /// The header grid does not match the output grid.
    GridMismatch {
        /// File being read.
        path: PathBuf,
        /// `(nx, ny)` of the output grid.
        expected: (usize, usize),
        /// `(nx, ny)` found in the header.
        got: (usize, usize),
    },
    /// A header time stamp disagrees with the step schedule.
    TimeMismatch {
        /// File being read.
        path: PathBuf,
        /// Which stamp (`"t0"` or `"t"`).
        which: &'static str,
        /// Time expected from the schedule.
        expected: f64,
        /// Time found in the header.
        got: f64,
    },
}

impl fmt::Display for FlowMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "step map {}: {source}", path.display()),
            Self::BadMagic { path } => {
                write!(f, "step map {}: bad magic (expected b\"GFMP\")", path.display())
            }
            Self::UnsupportedVersion { path, found } => {
                write!(f, "step map {}: unsupported version {found}", path.display())
            }
            Self::Truncated {
                path,
                expected,
                got,
            } => write!(
                f,
                "step map {}: {got} bytes, header implies {expected}",
                path.display()
            ),
            Self::GridMismatch {
                path,
                expected,
                got,
            } => write!(
                f,
                "step map {}: grid {}x{} does not match output grid {}x{}",
                path.display(),
                got.0,
                got.1,
                expected.0,
                expected.1
            ),
            Self::TimeMismatch {
                path,
                which,
                expected,
                got,
            } => write!(
                f,
                "step map {}: header {which} = {got}, schedule expects {expected}",
                path.display()
            ),
        }
    }
}

impl Error for FlowMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reads and writes step-map files for one run direction.
///
/// Filenames are `{file_prefix}{sign_tag}{t_end:.P}.bin` inside the store
/// directory, where `P` is the cadence precision — the same fixed-precision
/// stamp the snapshot files use, so a step map is fully addressed by its end
/// time.
pub struct StepMapStore {
    dir: PathBuf,
    file_prefix: String,
    direction: Direction,
    decimals: usize,
}

impl StepMapStore {
    /// Create a store rooted at `dir` for the given run direction.
    ///
    /// `dt_data` fixes the filename precision.
    pub fn new(dir: &Path, file_prefix: &str, direction: Direction, dt_data: f64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            file_prefix: file_prefix.to_string(),
            direction,
            decimals: time_decimals(dt_data),
        }
    }

    /// File path for the step map ending at `t_end`.
    pub fn path_for(&self, t_end: f64) -> PathBuf {
        let stamp = format_time(t_end, self.decimals);
        self.dir.join(format!(
            "{}{}{stamp}.bin",
            self.file_prefix,
            self.direction.file_tag()
        ))
    }

    /// Persist a step map, keyed by the field's current time.
    ///
    /// Returns the path written. Re-reading the file yields the positions
    /// bit-for-bit.
    pub fn write(&self, map: &PositionField) -> Result<PathBuf, FlowMapError> {
        let path = self.path_for(map.current_time());
        let io_err = |source| FlowMapError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_err)?;
        let mut w = BufWriter::new(file);
        let spec = map.spec();

        w.write_all(&MAGIC).map_err(io_err)?;
        w.write_all(&[FORMAT_VERSION]).map_err(io_err)?;
        w.write_all(&(spec.nx as u32).to_le_bytes()).map_err(io_err)?;
        w.write_all(&(spec.ny as u32).to_le_bytes()).map_err(io_err)?;
        w.write_all(&map.origin_time().to_le_bytes()).map_err(io_err)?;
        w.write_all(&map.current_time().to_le_bytes()).map_err(io_err)?;
        for [x, y] in map.positions() {
            w.write_all(&x.to_le_bytes()).map_err(io_err)?;
            w.write_all(&y.to_le_bytes()).map_err(io_err)?;
        }
        w.flush().map_err(io_err)?;
        Ok(path)
    }

    /// Load the step map ending at `t_end`, validating its header against
    /// the output grid.
    ///
    /// The file is memory-mapped and decoded from the mapping, so large
    /// grids avoid read syscalls per record; the byte layout is identical to
    /// a buffered read, and platforms without mmap could fall back to one
    /// with no semantic change.
    pub fn read(&self, t_end: f64, out_spec: GridSpec) -> Result<StepMap, FlowMapError> {
        let path = self.path_for(t_end);
        let io_err = |source| FlowMapError::Io {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(io_err)?;
        // SAFETY: the mapping is read-only and private to this call; the
        // decode below never outlives it. Concurrent truncation of a step
        // map mid-run is outside the I/O model (Phase B only reads files
        // Phase A finished writing).
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        let bytes: &[u8] = &mmap;

        if bytes.len() < HEADER_LEN {
            return Err(FlowMapError::Truncated {
                path,
                expected: HEADER_LEN,
                got: bytes.len(),
            });
        }
        if bytes[..4] != MAGIC {
            return Err(FlowMapError::BadMagic { path });
        }
        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(FlowMapError::UnsupportedVersion {
                path,
                found: version,
            });
        }

        let nx = u32::from_le_bytes(bytes[5..9].try_into().expect("4 bytes")) as usize;
        let ny = u32::from_le_bytes(bytes[9..13].try_into().expect("4 bytes")) as usize;
        if (nx, ny) != (out_spec.nx, out_spec.ny) {
            return Err(FlowMapError::GridMismatch {
                path,
                expected: (out_spec.nx, out_spec.ny),
                got: (nx, ny),
            });
        }
        let t0 = f64::from_le_bytes(bytes[13..21].try_into().expect("8 bytes"));
        let t = f64::from_le_bytes(bytes[21..29].try_into().expect("8 bytes"));

        let cell_count = nx * ny;
        let expected_len = HEADER_LEN + cell_count * RECORD_LEN;
        if bytes.len() != expected_len {
            return Err(FlowMapError::Truncated {
                path,
                expected: expected_len,
                got: bytes.len(),
            });
        }

        let mut data = Vec::with_capacity(cell_count);
        for rec in bytes[HEADER_LEN..].chunks_exact(RECORD_LEN) {
            let x = f64::from_le_bytes(rec[..8].try_into().expect("8 bytes"));
            let y = f64::from_le_bytes(rec[8..].try_into().expect("8 bytes"));
            data.push([x, y]);
        }
        let field = VectorField::from_vec(out_spec, data).expect("length checked above");

        Ok(StepMap { t0, t, field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn spec() -> GridSpec {
        GridSpec::new(4, 3, 0.0, 1.0, 0.0, 1.0).unwrap()
    }

    fn store(dir: &Path) -> StepMapStore {
        StepMapStore::new(dir, "run_", Direction::Forward, 0.25)
    }

    fn scrambled_map(t0: f64, t: f64) -> PositionField {
        let mut p = PositionField::uniform(spec(), t0);
        {
            let (pos, _) = p.cells_mut();
            for (k, cell) in pos.iter_mut().enumerate() {
                cell[0] += 0.001 * k as f64;
                cell[1] -= 0.002 * k as f64;
            }
        }
        p.set_current_time(t);
        p
    }

    #[test]
    fn filenames_carry_direction_and_end_time() {
        let dir = tempfile::tempdir().unwrap();
        let fwd = StepMapStore::new(dir.path(), "gyre_", Direction::Forward, 0.25);
        let bwd = StepMapStore::new(dir.path(), "gyre_", Direction::Backward, 0.25);
        assert!(fwd
            .path_for(1.5)
            .ends_with("gyre_positive_1.50.bin"));
        assert!(bwd
            .path_for(18.75)
            .ends_with("gyre_negative_18.75.bin"));
    }

    #[test]
    fn round_trips_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let map = scrambled_map(0.25, 0.5);

        let path = store.write(&map).unwrap();
        assert!(path.ends_with("run_positive_0.50.bin"));

        let got = store.read(0.5, spec()).unwrap();
        assert_eq!(got.t0.to_bits(), 0.25f64.to_bits());
        assert_eq!(got.t.to_bits(), 0.5f64.to_bits());
        assert_eq!(got.field.values(), map.positions());
    }

    #[test]
    fn rewriting_produces_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let map = scrambled_map(0.0, 0.25);

        let path = store.write(&map).unwrap();
        let first = fs::read(&path).unwrap();
        store.write(&map).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert!(matches!(
            store.read(0.75, spec()),
            Err(FlowMapError::Io { .. })
        ));
    }

    #[test]
    fn bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(store.path_for(0.25), b"XFMP0123456789_0123456789_012345").unwrap();
        assert!(matches!(
            store.read(0.25, spec()),
            Err(FlowMapError::BadMagic { .. })
        ));
    }

    #[test]
    fn wrong_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let path = store.write(&scrambled_map(0.0, 0.25)).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[4] = 9;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            store.read(0.25, spec()),
            Err(FlowMapError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn truncated_body_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let path = store.write(&scrambled_map(0.0, 0.25)).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 7);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            store.read(0.25, spec()),
            Err(FlowMapError::Truncated { .. })
        ));
    }

    #[test]
    fn grid_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.write(&scrambled_map(0.0, 0.25)).unwrap();

        let other = GridSpec::new(5, 3, 0.0, 1.0, 0.0, 1.0).unwrap();
        match store.read(0.25, other) {
            Err(FlowMapError::GridMismatch { expected, got, .. }) => {
                assert_eq!(expected, (5, 3));
                assert_eq!(got, (4, 3));
            }
            other => panic!("expected GridMismatch, got {other:?}"),
        }
    }
}
