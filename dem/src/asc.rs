//! ESRI ASCII grid (`.asc`) parsing.

use crate::{header::HeaderBuilder, DemError, Grid, SampleStore};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

pub(crate) fn load(path: &Path) -> Result<Grid, DemError> {
    let file = BufReader::new(File::open(path)?);
    parse(file, path)
}

/// Parses an ASCII grid from `rdr`; `path` is only used for error
/// reporting.
pub(crate) fn parse<R: BufRead>(rdr: R, path: &Path) -> Result<Grid, DemError> {
    let mut header = HeaderBuilder::default();
    let mut in_header = true;
    let mut samples = Vec::new();

    for line in rdr.lines() {
        let line = line?;
        if in_header {
            in_header = header.accept(&line, path)?;
            if in_header {
                continue;
            }
        }
        for token in line.split_whitespace() {
            let sample = token
                .parse::<f32>()
                .map_err(|_| DemError::Sample(token.to_owned(), path.to_owned()))?;
            samples.push(sample);
        }
    }

    let header = header.finish(path)?;
    if samples.len() != header.len() {
        return Err(DemError::SampleCount {
            expected: header.len(),
            actual: samples.len(),
        });
    }
    Grid::from_header(header, SampleStore::InMem(samples.into_boxed_slice()))
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::DemError;
    use geo::geometry::Coord;
    use std::{io::Cursor, path::Path};

    #[test]
    fn test_parse() {
        let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n3 4\n";
        let grid = parse(Cursor::new(text), Path::new("inline.asc")).unwrap();
        // First row in the file is the northern one.
        assert_eq!(grid.get(Coord { x: 0.5, y: 1.5 }), Some(1.0));
        assert_eq!(grid.get(Coord { x: 1.5, y: 0.5 }), Some(4.0));
    }

    #[test]
    fn test_short_body() {
        let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        let err = parse(Cursor::new(text), Path::new("inline.asc")).unwrap_err();
        assert!(matches!(
            err,
            DemError::SampleCount {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_bad_sample() {
        let text = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 x\n";
        let err = parse(Cursor::new(text), Path::new("inline.asc")).unwrap_err();
        assert!(matches!(err, DemError::Sample(ref s, _) if s == "x"));
    }
}
