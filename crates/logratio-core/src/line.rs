//! Access log line parsing.
//!
//! Line format, fields separated by runs of spaces or tabs:
//!
//! ```text
//! <ip> <user-id> <endpoint-path> <status-code> [<execution-time-ms>]
//! 10.0.0.1 hGsd8sdk /admin 200 12
//! ```

use crate::error::{Error, Result};

/// Minimum number of fields a line must carry.
pub const REQUIRED_FIELDS: usize = 4;

/// One parsed log line. Fields borrow from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    /// Client address.
    pub ip: &'a str,
    /// User identifier.
    pub uid: &'a str,
    /// Request path.
    pub endpoint: &'a str,
    /// HTTP status code, unparsed.
    pub status: &'a str,
    /// Execution time in milliseconds, if present. Not validated.
    pub exec_time_ms: Option<&'a str>,
}

impl<'a> LogRecord<'a> {
    /// Parses `line`. `line_no` is 1-based and only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLine`] if the line has fewer than
    /// [`REQUIRED_FIELDS`] fields.
    pub fn parse(line: &'a str, line_no: u64) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields = line.split([' ', '\t']).filter(|f| !f.is_empty());

        let (Some(ip), Some(uid), Some(endpoint), Some(status)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            let found = line.split([' ', '\t']).filter(|f| !f.is_empty()).count();
            return Err(Error::MalformedLine {
                line: line_no,
                expected: REQUIRED_FIELDS,
                found,
            });
        };

        Ok(Self {
            ip,
            uid,
            endpoint,
            status,
            exec_time_ms: fields.next(),
        })
    }

    /// True when the status code does not start with `2`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.status.starts_with('2')
    }
}
