use crate::error::HarnessError;

/// One execution outcome of the solver at one concurrency level.
///
/// `result` is kept exactly as the solver printed it and is only ever
/// compared as text. Parsing it into a number would erase formatting
/// differences (trailing zeros, exponent forms) that are real evidence of a
/// bug in the system under test.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub input_id: String,
    pub concurrency_level: u32,
    pub result: String,
    pub elapsed_time: f64,
}

/// One row of the experiment log.
///
/// Failure is a tagged record rather than in-band `-1` data fields: a
/// `Mismatch` row is always the final row of an aborted run and is always
/// preceded by the `ok` row of the trial that produced `actual`, so the log
/// itself carries the postmortem diff.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Ok(Trial),
    Mismatch {
        input_id: String,
        concurrency_level: u32,
        expected: String,
        actual: String,
    },
}

impl LogRecord {
    /// Persisted form: one comma-delimited line, tag column first.
    pub fn to_line(&self) -> String {
        match self {
            LogRecord::Ok(t) => format!(
                "ok,{},{},{},{}",
                t.input_id, t.concurrency_level, t.result, t.elapsed_time
            ),
            LogRecord::Mismatch {
                input_id,
                concurrency_level,
                expected,
                actual,
            } => format!(
                "mismatch,{},{},{},{}",
                input_id, concurrency_level, expected, actual
            ),
        }
    }

    pub fn parse_line(line: &str, line_no: usize) -> Result<LogRecord, HarnessError> {
        let malformed = || HarnessError::MalformedLog {
            line_no,
            line: line.to_string(),
        };
        let mut fields = line.splitn(5, ',');
        let tag = fields.next().ok_or_else(malformed)?;
        let input_id = fields.next().ok_or_else(malformed)?.to_string();
        let level: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(malformed)?;
        let third = fields.next().ok_or_else(malformed)?.to_string();
        let fourth = fields.next().ok_or_else(malformed)?.to_string();
        match tag {
            "ok" => {
                let elapsed_time: f64 = fourth.parse().map_err(|_| malformed())?;
                if !elapsed_time.is_finite() || elapsed_time < 0.0 {
                    return Err(malformed());
                }
                Ok(LogRecord::Ok(Trial {
                    input_id,
                    concurrency_level: level,
                    result: third,
                    elapsed_time,
                }))
            }
            "mismatch" => Ok(LogRecord::Mismatch {
                input_id,
                concurrency_level: level,
                expected: third,
                actual: fourth,
            }),
            _ => Err(malformed()),
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, LogRecord::Mismatch { .. })
    }
}
