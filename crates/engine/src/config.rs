//! Tuning knobs for scheduling, claiming and undo.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

/// Household-wide scheduling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Offset of the household's wall clock from UTC, in minutes. Local day
    /// boundaries (due times, "today", weekly resets) use this offset.
    pub utc_offset_minutes: i32,
    /// Maximum pool claims per user per local day. `0` means unlimited.
    pub max_claims_per_day: u32,
    /// How long after completing a chore the completion may be undone.
    pub undo_window_hours: i64,
    /// How often the in-process scheduler runs distribution, in seconds.
    pub distribution_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            max_claims_per_day: 1,
            undo_window_hours: 24,
            distribution_interval_secs: 300,
        }
    }
}

impl EngineConfig {
    /// The configured offset. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}
