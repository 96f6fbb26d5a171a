pub use crate::config::*;

/// The results of the battles of a session, in the order they were played.
///
/// Entries are only ever appended. The log lives as long as its owner.
///
/// ```
/// use country_battle::match_log::MatchLog;
/// use country_battle::MatchResult;
///
/// let mut log = MatchLog::new();
/// log.append(MatchResult {
///     country_a: "Chile".to_string(),
///     country_b: "Peru".to_string(),
///     winner: "Peru".to_string(),
/// });
/// assert_eq!(log.recent(MatchLog::SIDEBAR_SIZE)[0].winner, "Peru");
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MatchLog {
    entries: Vec<MatchResult>,
}

impl MatchLog {
    /// Number of results shown in the recent battles sidebar.
    pub const SIDEBAR_SIZE: usize = 5;

    pub fn new() -> MatchLog {
        MatchLog {
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, result: MatchResult) {
        self.entries.push(result);
    }

    /// Up to `n` results, the most recent first.
    pub fn recent(&self, n: usize) -> Vec<&MatchResult> {
        self.entries.iter().rev().take(n).collect()
    }

    /// All the results, the oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
