//! ESRI binary float grid: a headerless `.flt` file of 32-bit
//! samples described by a `.hdr` sidecar.

use crate::{
    header::{Header, HeaderBuilder},
    DemError, Grid, SampleStore,
};
use byteorder::{BigEndian as BE, LittleEndian as LE, ReadBytesExt};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    mem::size_of,
    path::{Path, PathBuf},
};

/// Returns a Grid read into memory from the `.flt` file at `path`.
pub(crate) fn load(path: &Path) -> Result<Grid, DemError> {
    let header = read_header(path)?;
    check_len(path, &header)?;

    let mut file = BufReader::new(File::open(path)?);
    let mut samples = Vec::with_capacity(header.len());
    for _ in 0..header.len() {
        let sample = if header.big_endian {
            file.read_f32::<BE>()?
        } else {
            file.read_f32::<LE>()?
        };
        samples.push(sample);
    }

    Grid::from_header(header, SampleStore::InMem(samples.into_boxed_slice()))
}

/// Returns a Grid using the memory-mapped `.flt` file as storage.
pub(crate) fn memmap(path: &Path) -> Result<Grid, DemError> {
    let header = read_header(path)?;
    check_len(path, &header)?;

    let file = File::open(path)?;
    // SAFETY: the mapping is read-only, and we don't defend against
    // other processes truncating the grid while we use it.
    let map = unsafe { Mmap::map(&file)? };

    Grid::from_header(
        header,
        SampleStore::MemMap {
            map,
            big_endian: header.big_endian,
        },
    )
}

fn check_len(path: &Path, header: &Header) -> Result<(), DemError> {
    #[allow(clippy::cast_possible_truncation)]
    let actual = path.metadata()?.len() as usize / size_of::<f32>();
    if actual == header.len() {
        Ok(())
    } else {
        Err(DemError::SampleCount {
            expected: header.len(),
            actual,
        })
    }
}

fn read_header(path: &Path) -> Result<Header, DemError> {
    let hdr_path = header_path(path);
    let rdr = BufReader::new(File::open(&hdr_path)?);
    let mut header = HeaderBuilder::default();
    for line in rdr.lines() {
        let line = line?;
        if !header.accept(&line, &hdr_path)? {
            return Err(DemError::Header(line, hdr_path));
        }
    }
    header.finish(&hdr_path)
}

/// Returns the sidecar header path, tolerating upper-case extensions.
fn header_path(path: &Path) -> PathBuf {
    let hdr_path = path.with_extension("hdr");
    if hdr_path.exists() {
        hdr_path
    } else {
        path.with_extension("HDR")
    }
}
