//! Parsers for `/proc` filesystem files.
//!
//! Pure functions over file contents, testable with string inputs.

/// A `/proc` file whose content did not have the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed proc file: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Fields of `/proc/[pid]/stat` needed for sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    /// User mode time in clock ticks.
    pub utime: u64,
    /// Kernel mode time in clock ticks.
    pub stime: u64,
    /// Resident set size in pages.
    pub rss: i64,
}

impl ProcStat {
    /// Total CPU time consumed so far, in clock ticks.
    pub fn total_ticks(&self) -> u64 {
        self.utime + self.stime
    }
}

/// Index of each field we need, counted from `state` (field 3 in proc(5)).
const STATE: usize = 0;
const UTIME: usize = 11;
const STIME: usize = 12;
const RSS: usize = 21;

/// Parses `/proc/[pid]/stat`.
///
/// The comm field may itself contain spaces and parentheses, so it spans from
/// the first `(` to the last `)`.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let (head, rest) = content
        .trim()
        .split_once('(')
        .ok_or_else(|| ParseError::new("stat has no comm field"))?;
    let (comm, tail) = rest
        .rsplit_once(')')
        .ok_or_else(|| ParseError::new("stat comm field is not closed"))?;

    let pid = head
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::new(format!("bad pid {:?}", head.trim())))?;

    let fields: Vec<&str> = tail.split_whitespace().collect();
    if fields.len() <= RSS {
        return Err(ParseError::new(format!(
            "stat of pid {} has {} fields after comm, need {}",
            pid,
            fields.len(),
            RSS + 1
        )));
    }

    fn number<T: std::str::FromStr>(
        fields: &[&str],
        idx: usize,
        what: &str,
    ) -> Result<T, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("bad {} {:?}", what, fields[idx])))
    }

    Ok(ProcStat {
        pid,
        comm: comm.to_string(),
        state: fields[STATE].chars().next().unwrap_or('?'),
        utime: number(&fields, UTIME, "utime")?,
        stime: number(&fields, STIME, "stime")?,
        rss: number(&fields, RSS, "rss")?,
    })
}

/// Counts per-CPU lines (`cpu0`, `cpu1`, ...) in `/proc/stat`.
pub fn count_cpus(content: &str) -> usize {
    content
        .lines()
        .filter(|line| {
            line.strip_prefix("cpu")
                .and_then(|rest| rest.split(char::is_whitespace).next())
                .is_some_and(|id| id.parse::<u32>().is_ok())
        })
        .count()
}
