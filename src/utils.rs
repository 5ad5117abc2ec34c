//! Utility functions for files.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;

//-----------------------------------------------------------------------------

/// Returns the full file name for a specific test file.
pub fn get_test_data(filename: &'static str) -> PathBuf {
    let mut buf = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    buf.push("test-data");
    buf.push(filename);
    buf
}

//-----------------------------------------------------------------------------

const SIZE_UNITS: [(f64, &str); 5] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: u64) -> String {
    let value = bytes as f64;
    let unit = SIZE_UNITS.iter().rposition(|(size, _)| value >= *size).unwrap_or(0);
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file, or [`None`] if the file cannot be accessed.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len()))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

//-----------------------------------------------------------------------------

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Returns a buffered reader for the file, which may be gzip-compressed.
///
/// Compression is detected from the magic bytes rather than the file name.
pub fn open_file<P: AsRef<Path>>(filename: P) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(&filename)?;
    let mut inner = BufReader::new(file);
    let gzipped = inner.fill_buf()?.starts_with(&GZIP_MAGIC);
    if gzipped {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    fn read_to_string(filename: &Path) -> String {
        let reader = open_file(filename);
        assert!(reader.is_ok(), "Failed to open {}: {}", filename.display(), reader.err().unwrap());
        let mut result = String::new();
        let len = reader.unwrap().read_to_string(&mut result);
        assert!(len.is_ok(), "Failed to read {}: {}", filename.display(), len.unwrap_err());
        result
    }

    #[test]
    fn plain_and_gzipped() {
        let plain = read_to_string(&get_test_data("sample_sequencing_data.csv"));
        let gzipped = read_to_string(&get_test_data("sample_sequencing_data.csv.gz"));
        assert!(plain.starts_with("id,sequence_id,type,location"), "Unexpected file contents");
        assert_eq!(gzipped, plain, "Decompressed contents differ");
    }

    #[test]
    fn missing_file() {
        let filename = get_test_data("missing.csv");
        assert!(!file_exists(&filename));
        assert!(open_file(&filename).is_err(), "Opened a missing file");
        assert!(file_size(&filename).is_none(), "Got a size for a missing file");
    }

    #[test]
    fn sizes() {
        assert_eq!(human_readable_size(0), "0.000 B");
        assert_eq!(human_readable_size(1000), "1000.000 B");
        assert_eq!(human_readable_size(1536), "1.500 KiB");
        assert_eq!(human_readable_size(3 * 1024 * 1024), "3.000 MiB");
    }
}

//-----------------------------------------------------------------------------
