//! The velocity snapshot text format.
//!
//! One file per snapshot time. Line 1 is `nx`, line 2 `ny`, line 3 the
//! snapshot time, then for each `i = 0..nx`, for each `j = 0..ny`, the `u`
//! component on one line and the `v` component on the next — the same
//! x-major nesting as all flat field storage.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use gyre_core::{GridSpec, VectorField};

/// A velocity snapshot: the sample time plus one 2-vector per data-grid node.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Time at which the field was sampled.
    pub t: f64,
    /// Velocity vectors on the data grid.
    pub field: VectorField,
}

/// Errors from reading or writing snapshot files.
#[derive(Debug)]
pub enum SnapshotError {
    /// An I/O error on the named file.
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file's contents do not parse as the snapshot format.
    Malformed {
        /// File being read.
        path: PathBuf,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The file's header grid does not match the configured data grid.
    GridMismatch {
        /// File being read.
        path: PathBuf,
        /// `(nx, ny)` expected from the configuration.
        expected: (usize, usize),
        /// `(nx, ny)` found in the header.
        got: (usize, usize),
    },
    /// The file's header time does not match the time implied by its index.
    TimeMismatch {
        /// File being read.
        path: PathBuf,
        /// Time expected from the snapshot cadence.
        expected: f64,
        /// Time found in the header.
        got: f64,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot {}: {source}", path.display())
            }
            Self::Malformed { path, detail } => {
                write!(f, "snapshot {}: {detail}", path.display())
            }
            Self::GridMismatch {
                path,
                expected,
                got,
            } => write!(
                f,
                "snapshot {}: grid {}x{} does not match configured {}x{}",
                path.display(),
                got.0,
                got.1,
                expected.0,
                expected.1,
            ),
            Self::TimeMismatch {
                path,
                expected,
                got,
            } => write!(
                f,
                "snapshot {}: header time {got} does not match cadence time {expected}",
                path.display(),
            ),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Line-oriented number puller over a buffered reader.
struct Lines<R: BufRead> {
    reader: R,
    path: PathBuf,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<String, SnapshotError> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(|source| SnapshotError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.line_no += 1;
        if n == 0 {
            return Err(SnapshotError::Malformed {
                path: self.path.clone(),
                detail: format!("unexpected end of file at line {}", self.line_no),
            });
        }
        Ok(line.trim().to_string())
    }

    fn next_usize(&mut self) -> Result<usize, SnapshotError> {
        let line = self.next_line()?;
        line.parse().map_err(|_| SnapshotError::Malformed {
            path: self.path.clone(),
            detail: format!("line {}: expected integer, got \"{line}\"", self.line_no),
        })
    }

    fn next_f64(&mut self) -> Result<f64, SnapshotError> {
        let line = self.next_line()?;
        line.parse().map_err(|_| SnapshotError::Malformed {
            path: self.path.clone(),
            detail: format!("line {}: expected number, got \"{line}\"", self.line_no),
        })
    }
}

/// Read one snapshot file on the given data grid.
///
/// The header `(nx, ny)` must match `data_spec`; the header time is returned
/// as-is (the cache checks it against the cadence).
pub fn read_snapshot(path: &Path, data_spec: GridSpec) -> Result<Snapshot, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Lines::new(BufReader::new(file), path);

    let nx = lines.next_usize()?;
    let ny = lines.next_usize()?;
    if (nx, ny) != (data_spec.nx, data_spec.ny) {
        return Err(SnapshotError::GridMismatch {
            path: path.to_path_buf(),
            expected: (data_spec.nx, data_spec.ny),
            got: (nx, ny),
        });
    }
    let t = lines.next_f64()?;

    let mut data = Vec::with_capacity(data_spec.cell_count());
    for _ in 0..data_spec.cell_count() {
        let u = lines.next_f64()?;
        let v = lines.next_f64()?;
        data.push([u, v]);
    }

    // Length is cell_count by construction, so from_vec cannot fail here.
    let field = VectorField::from_vec(data_spec, data).map_err(|e| SnapshotError::Malformed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(Snapshot { t, field })
}

/// Write one snapshot file.
///
/// Values are printed with Rust's shortest round-trip formatting, so a
/// read-back reproduces the field bit-for-bit.
pub fn write_snapshot(path: &Path, t: f64, field: &VectorField) -> Result<(), SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "{}", field.spec().nx).map_err(io_err)?;
    writeln!(w, "{}", field.spec().ny).map_err(io_err)?;
    writeln!(w, "{t}").map_err(io_err)?;
    for [u, v] in field.values() {
        writeln!(w, "{u}").map_err(io_err)?;
        writeln!(w, "{v}").map_err(io_err)?;
    }
    w.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn spec() -> GridSpec {
        GridSpec::new(3, 2, 0.0, 2.0, 0.0, 1.0).unwrap()
    }

    fn sample_field() -> VectorField {
        let data: Vec<[f64; 2]> = (0..6).map(|k| [k as f64 * 0.1, -(k as f64)]).collect();
        VectorField::from_vec(spec(), data).unwrap()
    }

    #[test]
    fn round_trips_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        let field = sample_field();

        write_snapshot(&path, 1.5, &field).unwrap();
        let got = read_snapshot(&path, spec()).unwrap();

        assert_eq!(got.t, 1.5);
        assert_eq!(got.field, field);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot(&dir.path().join("absent.txt"), spec()).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn grid_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        write_snapshot(&path, 0.0, &sample_field()).unwrap();

        let other = GridSpec::new(4, 2, 0.0, 2.0, 0.0, 1.0).unwrap();
        match read_snapshot(&path, other).unwrap_err() {
            SnapshotError::GridMismatch { expected, got, .. } => {
                assert_eq!(expected, (4, 2));
                assert_eq!(got, (3, 2));
            }
            other => panic!("expected GridMismatch, got {other:?}"),
        }
    }

    #[test]
    fn truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "3\n2\n0.0\n1.0").unwrap();

        match read_snapshot(&path, spec()).unwrap_err() {
            SnapshotError::Malformed { detail, .. } => {
                assert!(detail.contains("end of file"), "wrong detail: {detail}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn garbage_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "3\n2\nnot-a-number").unwrap();

        match read_snapshot(&path, spec()).unwrap_err() {
            SnapshotError::Malformed { detail, .. } => {
                assert!(detail.contains("expected number"), "wrong detail: {detail}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
