//! Human-readable overlap reports.

use crate::{OverlapSummary, Result};

use std::io::Write;

//-----------------------------------------------------------------------------

/// Header line of the report.
pub const HEADER: &str = "Overlaps occur between:";

/// Writes the header line followed by one line per summary.
///
/// Each line has the form `<first> and <second> at locations <min> to <max>`.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if writing to the output fails.
pub fn write_report<W: Write>(summaries: &[OverlapSummary], output: &mut W) -> Result<()> {
    writeln!(output, "{}", HEADER)?;
    for summary in summaries.iter() {
        writeln!(output, "{}", summary)?;
    }
    output.flush()?;
    Ok(())
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Error;

    use std::io;

    // Accepts `capacity` bytes and then fails.
    struct FailingWriter {
        capacity: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.capacity == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"));
            }
            let len = buf.len().min(self.capacity);
            self.capacity -= len;
            Ok(len)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report(summaries: &[OverlapSummary]) -> String {
        let mut output: Vec<u8> = Vec::new();
        let result = write_report(summaries, &mut output);
        assert!(result.is_ok(), "Failed to write the report: {}", result.unwrap_err());
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn header_only() {
        assert_eq!(report(&[]), "Overlaps occur between:\n");
    }

    #[test]
    fn summary_lines() {
        let summaries = vec![
            OverlapSummary::new("chr1 exon", "chr1 intron", 13, 15),
            OverlapSummary::new("chr1 exon", "chr2 exon", -4, 15),
        ];
        let expected = "Overlaps occur between:\n\
                        chr1 exon and chr1 intron at locations 13 to 15\n\
                        chr1 exon and chr2 exon at locations -4 to 15\n";
        assert_eq!(report(&summaries), expected);
    }

    #[test]
    fn write_failure() {
        let summaries = vec![OverlapSummary::new("chr1 exon", "chr1 intron", 13, 15)];
        for capacity in [0, HEADER.len() + 5] {
            let mut output = FailingWriter { capacity };
            let result = write_report(&summaries, &mut output);
            assert!(matches!(result, Err(Error::Io(_))), "Wrong result for a failing writer with capacity {}", capacity);
        }
    }
}

//-----------------------------------------------------------------------------
