//! Streaming byte-equality comparison across candidate files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Comparison chunk size.
const CHUNK_SIZE: usize = 8192;

/// Compare all paths for byte equality.
///
/// Opens every path and reads fixed-size chunks in lockstep, returning
/// false on the first mismatching chunk and true only when every stream
/// reaches end-of-input together. Zero or one input is trivially equal.
/// Symlinked paths are compared by the content they resolve to.
pub fn paths_equal<P: AsRef<Path>>(paths: &[P]) -> io::Result<bool> {
    if paths.len() < 2 {
        return Ok(true);
    }

    let mut files = paths
        .iter()
        .map(|p| File::open(p.as_ref()))
        .collect::<io::Result<Vec<_>>>()?;

    let mut reference = [0u8; CHUNK_SIZE];
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let Some((first, rest)) = files.split_first_mut() else {
            return Ok(true);
        };
        let len = read_chunk(first, &mut reference)?;

        for file in rest {
            if read_chunk(file, &mut chunk)? != len || chunk[..len] != reference[..len] {
                return Ok(false);
            }
        }

        if len == 0 {
            return Ok(true);
        }
    }
}

/// Fill as much of `buf` as the stream allows, retrying short reads.
fn read_chunk(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
