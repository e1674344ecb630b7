use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::controller::SessionError;
use crate::events::Feedback;
use crate::timer::{Countdown, Deferred};
use crate::validation::{ValidationError, ValidationResult};
use crate::word_list::WordList;

/// How the learner answers each word
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InputMode {
    #[default]
    Typed,
    Paper,
}

/// Raw settings as collected from the CLI and config file, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub word_source: String,
    pub time_limit_secs: i64,
    pub random_order: bool,
    pub input_mode: InputMode,
    pub default_word_count: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            word_source: String::new(),
            time_limit_secs: 30,
            random_order: false,
            input_mode: InputMode::Typed,
            default_word_count: 10,
        }
    }
}

/// Immutable configuration for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub word_list: WordList,
    pub per_word_time_limit_secs: u32,
    pub random_order: bool,
    pub input_mode: InputMode,
}

impl SessionConfig {
    /// Validate raw settings and fix the word order for the session.
    pub fn from_settings<R: Rng + ?Sized>(
        settings: &SessionSettings,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let per_word_time_limit_secs = u32::try_from(settings.time_limit_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(SessionError::InvalidTimeLimit(settings.time_limit_secs))?;

        let default_count = usize::try_from(settings.default_word_count)
            .ok()
            .filter(|count| *count > 0)
            .ok_or(SessionError::InvalidWordCount(settings.default_word_count))?;

        let word_list = WordList::from_source(
            &settings.word_source,
            default_count,
            settings.random_order,
            rng,
        );

        Ok(Self {
            word_list,
            per_word_time_limit_secs,
            random_order: settings.random_order,
            input_mode: settings.input_mode,
        })
    }
}

/// Sub-state of a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningPhase {
    Presenting,
    AwaitingValidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running(RunningPhase),
    Finished,
}

impl Phase {
    pub fn is_presenting(&self) -> bool {
        matches!(self, Phase::Running(RunningPhase::Presenting))
    }

    pub fn is_awaiting_validation(&self) -> bool {
        matches!(self, Phase::Running(RunningPhase::AwaitingValidation))
    }
}

/// Final numbers for a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub score: usize,
    pub total_words_presented: usize,
    pub total_words: usize,
    pub elapsed: Duration,
    pub started_at: DateTime<Local>,
    pub input_mode: InputMode,
    pub validation: Option<ValidationResult>,
    pub validation_error: Option<ValidationError>,
}

/// Mutable state of the session in progress
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub current_index: usize,
    pub score: usize,
    pub hints_used: u8,
    pub presented_words: Vec<String>,
    pub session_started_at: Duration,
    pub started_at: DateTime<Local>,
    pub word_started_at: Duration,
    /// Set once the current word's outcome is recorded; cleared on the next word
    pub word_resolved: bool,
    pub feedback: Option<Feedback>,
    pub countdown: Option<Countdown>,
    pub pending: Option<Deferred>,
    pub validation_in_flight: Option<u64>,
    pub validation: Option<ValidationResult>,
    pub validation_error: Option<ValidationError>,
    pub summary: Option<SessionSummary>,
}

impl SessionState {
    pub fn new(now: Duration) -> Self {
        Self {
            phase: Phase::Running(RunningPhase::Presenting),
            current_index: 0,
            score: 0,
            hints_used: 0,
            presented_words: Vec::new(),
            session_started_at: now,
            started_at: Local::now(),
            word_started_at: now,
            word_resolved: false,
            feedback: None,
            countdown: None,
            pending: None,
            validation_in_flight: None,
            validation: None,
            validation_error: None,
            summary: None,
        }
    }

    /// Drop the countdown and any deferred transition.
    pub fn cancel_timers(&mut self) {
        self.countdown = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_settings_default() {
        let settings = SessionSettings::default();
        assert_eq!(settings.time_limit_secs, 30);
        assert_eq!(settings.default_word_count, 10);
        assert_eq!(settings.input_mode, InputMode::Typed);
        assert!(!settings.random_order);
    }

    #[test]
    fn test_config_from_valid_settings() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = SessionSettings {
            word_source: "cat, dog".into(),
            time_limit_secs: 12,
            input_mode: InputMode::Paper,
            ..Default::default()
        };
        let config = SessionConfig::from_settings(&settings, &mut rng).unwrap();
        assert_eq!(config.per_word_time_limit_secs, 12);
        assert_eq!(config.input_mode, InputMode::Paper);
        assert_eq!(config.word_list.words(), ["cat", "dog"]);
    }

    #[test]
    fn test_config_rejects_non_positive_time_limit() {
        let mut rng = StdRng::seed_from_u64(1);
        for bad in [0, -5] {
            let settings = SessionSettings {
                time_limit_secs: bad,
                ..Default::default()
            };
            assert_matches!(
                SessionConfig::from_settings(&settings, &mut rng),
                Err(SessionError::InvalidTimeLimit(v)) if v == bad
            );
        }
    }

    #[test]
    fn test_config_rejects_oversized_time_limit() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = SessionSettings {
            time_limit_secs: i64::from(u32::MAX) + 1,
            ..Default::default()
        };
        assert_matches!(
            SessionConfig::from_settings(&settings, &mut rng),
            Err(SessionError::InvalidTimeLimit(_))
        );
    }

    #[test]
    fn test_config_rejects_bad_word_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = SessionSettings {
            default_word_count: 0,
            ..Default::default()
        };
        assert_matches!(
            SessionConfig::from_settings(&settings, &mut rng),
            Err(SessionError::InvalidWordCount(0))
        );
    }

    #[test]
    fn test_input_mode_display() {
        assert_eq!(InputMode::Typed.to_string(), "typed");
        assert_eq!(InputMode::Paper.to_string(), "paper");
    }

    #[test]
    fn test_phase_helpers() {
        assert!(Phase::Running(RunningPhase::Presenting).is_presenting());
        assert!(Phase::Running(RunningPhase::AwaitingValidation).is_awaiting_validation());
        assert!(!Phase::Finished.is_presenting());
        assert!(!Phase::Idle.is_awaiting_validation());
    }

    #[test]
    fn test_cancel_timers() {
        let mut state = SessionState::new(Duration::ZERO);
        state.countdown = Some(Countdown::start(5, Duration::ZERO));
        state.pending = Some(Deferred::new(
            Duration::ZERO,
            Duration::from_secs(1),
            crate::timer::DeferredAction::AdvanceWord,
        ));
        state.cancel_timers();
        assert!(state.countdown.is_none());
        assert!(state.pending.is_none());
    }
}
