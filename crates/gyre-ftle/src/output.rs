//! Text output of FTLE fields.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gyre_core::ScalarField;

/// Write an FTLE field in the run's text output format.
///
/// Line 1 is `nx`, line 2 `ny`, line 3 the origin time, line 4 the final
/// time, then one value per line in x-major order. Values use Rust's
/// shortest round-trip formatting; sentinel cells print as `NaN`.
pub fn write_ftle(
    path: &Path,
    field: &ScalarField,
    t_origin: f64,
    t_final: f64,
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "{}", field.spec().nx)?;
    writeln!(w, "{}", field.spec().ny)?;
    writeln!(w, "{t_origin}")?;
    writeln!(w, "{t_final}")?;
    for v in field.values() {
        writeln!(w, "{v}")?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::GridSpec;
    use std::fs;

    #[test]
    fn header_then_one_value_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let spec = GridSpec::new(2, 3, 0.0, 1.0, 0.0, 1.0).unwrap();
        let field =
            ScalarField::from_vec(spec, vec![0.5, 1.25, f64::NAN, -0.75, 0.0, 2.0]).unwrap();

        write_ftle(&path, &field, 0.0, 20.0).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 + 6);
        assert_eq!(&lines[..4], &["2", "3", "0", "20"]);
        assert_eq!(lines[4], "0.5");
        assert_eq!(lines[6], "NaN");

        // Every value round-trips through parse, sentinel included.
        let parsed: Vec<f64> = lines[4..].iter().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed[1], 1.25);
        assert!(parsed[2].is_nan());
    }
}
