use chrono::{DateTime, Days, Months, Utc};

/// Turns a textual date cue into an absolute instant
///
/// Returning `None` means the phrase carries no cue this resolver knows;
/// the caller then treats the text as an ordinary date-time.
pub trait DatePhraseResolver: Send + Sync {
    fn resolve(&self, phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Offset applied for a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueOffset {
    Days(u64),
    Months(u32),
}

impl CueOffset {
    /// Apply the offset to `now`
    ///
    /// Month arithmetic clamps to the last day of a shorter month
    /// (Jan 31 + 1 month = Feb 28/29).
    pub fn apply(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            CueOffset::Days(days) => now.checked_add_days(Days::new(days)),
            CueOffset::Months(months) => now.checked_add_months(Months::new(months)),
        }
    }
}

/// Substring matcher for a fixed list of cues
///
/// Cues are tried in order and the first match wins; matches are not
/// combined. Any time of day in the phrase is ignored and the result keeps
/// the time of day of `now`.
#[derive(Debug, Clone)]
pub struct RelativeCueResolver {
    cues: Vec<(String, CueOffset)>,
}

impl Default for RelativeCueResolver {
    fn default() -> Self {
        Self::new()
            .with_cue("tomorrow", CueOffset::Days(1))
            .with_cue("next week", CueOffset::Days(7))
            .with_cue("next month", CueOffset::Months(1))
    }
}

impl RelativeCueResolver {
    /// Resolver with no cues
    pub fn new() -> Self {
        Self { cues: Vec::new() }
    }

    /// Append a cue with the lowest priority so far
    pub fn with_cue(mut self, cue: &str, offset: CueOffset) -> Self {
        self.cues.push((cue.to_lowercase(), offset));
        self
    }
}

impl DatePhraseResolver for RelativeCueResolver {
    fn resolve(&self, phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let lower = phrase.to_lowercase();
        self.cues
            .iter()
            .find(|(cue, _)| lower.contains(cue.as_str()))
            .and_then(|(_, offset)| offset.apply(now))
    }
}
