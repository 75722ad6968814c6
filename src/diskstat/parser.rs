//! Parser for blkio accounting files such as `blkio.throttle.io_service_bytes`.
//!
//! Each line is either `<device> <operation> <value>` or `<operation> <value>`:
//!
//! ```text
//! 8:0 Read 4096
//! 8:0 Write 512
//! 8:0 Sync 0
//! 8:0 Async 4608
//! 8:0 Total 4608
//! Total 4608
//! ```
//!
//! Values are summed per operation into the five disk columns. Operations are matched
//! case-insensitively, unknown operations and lines of any other shape are skipped, and a value
//! that is not an unsigned integer counts as zero.

use std::io::BufRead;
use std::path::Path;

use crate::metrics::DiskTotals;

use super::error::InvalidValue;
use super::{Error, Result};

/// Parses `value` as `u64`, logging and returning `0` if it is not a valid unsigned integer.
pub fn parse_or_zero(operation: &str, value: &str, line: usize, path: &Path) -> u64 {
    match value.parse::<u64>() {
        Ok(parsed) => parsed,
        Err(source) => {
            let err = InvalidValue {
                operation: operation.to_owned(),
                value: value.to_owned(),
                line,
                source,
            };
            log::warn!(
                target: "diskstat",
                "treating malformed value as zero: path={}, error={}",
                path.display(),
                err
            );
            0
        }
    }
}

/// Splits a line into operation and value, or `None` if it has an unexpected shape.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(_device), Some(operation), Some(value), None) => Some((operation, value)),
        (Some(operation), Some(value), None, None) => Some((operation, value)),
        _ => None,
    }
}

/// Sums all lines of an accounting file.
///
/// `path` is only used for log and error context.
///
/// # Errors
///
/// Returns [`Error::ReadLine`] if reading from `buf` fails.
pub fn parse_accounting<R: BufRead>(buf: &mut R, path: &Path) -> Result<DiskTotals> {
    let mut totals = DiskTotals::default();
    let mut line = String::new();
    let mut lineno = 0;

    while buf.read_line(&mut line).map_err(|source| Error::ReadLine {
        path: path.to_path_buf(),
        source,
    })? != 0
    {
        lineno += 1;
        if let Some((operation, value)) = split_line(&line) {
            let value = parse_or_zero(operation, value, lineno, path);
            if !totals.add(operation, value) {
                log::trace!(
                    target: "diskstat",
                    "ignoring operation `{}` at line {} of `{}`",
                    operation,
                    lineno,
                    path.display()
                );
            }
        }
        line.clear();
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> DiskTotals {
        parse_accounting(&mut data.as_bytes(), Path::new("test")).unwrap()
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), DiskTotals::default());
    }

    #[test]
    fn test_parse_sums_categories_across_lines() {
        let data = "\
8:0 Read 10
8:16 Read 20
253:0 Read 30
8:0 Write 5
";
        let totals = parse(data);
        assert_eq!(totals.get("read"), Some(60));
        assert_eq!(totals.get("write"), Some(5));
        assert_eq!(totals.get("total"), Some(0));
    }

    #[test]
    fn test_two_and_three_field_lines_contribute_equally() {
        assert_eq!(parse("async 7\n").get("async"), Some(7));
        assert_eq!(parse("8:0 async 7\n").get("async"), Some(7));
        assert_eq!(parse("async 7\n8:0 async 7\n").get("async"), Some(14));
    }

    #[test]
    fn test_parse_complete_file() {
        let data = "\
8:0 Read 4096
8:0 Write 512
8:0 Sync 100
8:0 Async 4508
8:0 Total 4608
Total 4608
";
        let totals = parse(data);
        let point = totals.into_point("web1.dsk.io_service_bytes".into());
        assert_eq!(point.values(), [4096, 512, 100, 4508, 9216]);
    }

    #[test]
    fn test_malformed_value_counts_as_zero() {
        let data = "\
8:0 Read abc
8:0 Read 12
8:0 Write -4
";
        let totals = parse(data);
        assert_eq!(totals.get("read"), Some(12));
        assert_eq!(totals.get("write"), Some(0));
    }

    #[test]
    fn test_unexpected_shapes_and_operations_are_skipped() {
        let data = "\
8:0 Discard 99
Read
8:0 Read 1 extra
\t
8:0  Read   3
";
        let totals = parse(data);
        assert_eq!(totals.get("read"), Some(3));
        assert_eq!(totals.into_point("x".into()).values(), [3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(parse_or_zero("read", "42", 1, Path::new("f")), 42);
        assert_eq!(parse_or_zero("read", "", 1, Path::new("f")), 0);
        assert_eq!(parse_or_zero("read", "1.5", 1, Path::new("f")), 0);
    }
}
