use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::events::{Cue, Feedback, SessionEvent};
use crate::session::{
    InputMode, Phase, RunningPhase, SessionConfig, SessionSettings, SessionState, SessionSummary,
};
use crate::timer::{
    Clock, Countdown, Deferred, DeferredAction, GracePeriods, SystemClock, CUE_THRESHOLD_SECS,
};
use crate::validation::{
    parse_validation_response, ValidationError, ValidationRequest, ValidationResult,
};

/// Hints available per word; the n-th hint reveals n letters
pub const MAX_HINTS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("time limit must be a positive number of seconds, got {0}")]
    InvalidTimeLimit(i64),
    #[error("word count must be a positive number, got {0}")]
    InvalidWordCount(i64),
    #[error("a session is already in progress")]
    AlreadyStarted,
    #[error("no word is being presented")]
    NotPresenting,
    #[error("not available in {0} mode")]
    WrongInputMode(InputMode),
    #[error("the current word has already been answered")]
    WordResolved,
    #[error("the session is not waiting for validation")]
    NotAwaitingValidation,
    #[error("a validation request is already in flight")]
    ValidationInFlight,
    #[error("validation ticket {0} does not belong to the request in flight")]
    StaleValidation(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Revealed(String),
    Exhausted,
}

fn presenting_parts<'a>(
    config: &'a Option<SessionConfig>,
    state: &'a mut Option<SessionState>,
) -> Result<(&'a SessionConfig, &'a mut SessionState), SessionError> {
    match (config.as_ref(), state.as_mut()) {
        (Some(config), Some(state)) if state.phase.is_presenting() => Ok((config, state)),
        _ => Err(SessionError::NotPresenting),
    }
}

fn awaiting_parts(
    state: &mut Option<SessionState>,
) -> Result<&mut SessionState, SessionError> {
    match state.as_mut() {
        Some(state) if state.phase.is_awaiting_validation() => Ok(state),
        _ => Err(SessionError::NotAwaitingValidation),
    }
}

/// Record the on-screen word as presented and lock it against further answers.
fn resolve_current_word(config: &SessionConfig, state: &mut SessionState) -> String {
    let word = config.word_list[state.current_index].clone();
    state.countdown = None;
    state.word_resolved = true;
    state.presented_words.push(word.clone());
    word
}

/// Drives one playthrough: word order, per-word countdowns, answers, hints,
/// and the paper-mode validation hand-off.
///
/// The controller never blocks and performs no I/O. Time only moves when
/// [`SessionController::tick`] polls the clock, and every side effect is
/// queued as a [`SessionEvent`] for the caller to drain.
pub struct SessionController<C: Clock = SystemClock> {
    clock: C,
    grace: GracePeriods,
    config: Option<SessionConfig>,
    state: Option<SessionState>,
    events: Vec<SessionEvent>,
    next_ticket: u64,
}

impl SessionController<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new(), GracePeriods::interactive())
    }
}

impl Default for SessionController<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_clock(clock: C, grace: GracePeriods) -> Self {
        Self {
            clock,
            grace,
            config: None,
            state: None,
            events: Vec::new(),
            next_ticket: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn input_mode(&self) -> Option<InputMode> {
        self.config.as_ref().map(|c| c.input_mode)
    }

    pub fn score(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.score)
    }

    pub fn current_index(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.current_index)
    }

    pub fn total_words(&self) -> usize {
        self.config.as_ref().map_or(0, |c| c.word_list.len())
    }

    pub fn presented_words(&self) -> &[String] {
        self.state
            .as_ref()
            .map_or(&[][..], |s| s.presented_words.as_slice())
    }

    pub fn hints_used(&self) -> u8 {
        self.state.as_ref().map_or(0, |s| s.hints_used)
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.state.as_ref().and_then(|s| s.feedback.as_ref())
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.state.as_ref().and_then(|s| s.countdown.as_ref())
    }

    pub fn has_pending_transition(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.pending.is_some())
    }

    pub fn is_word_resolved(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.word_resolved)
    }

    pub fn is_validation_in_flight(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.validation_in_flight.is_some())
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.state.as_ref().and_then(|s| s.summary.as_ref())
    }

    /// Session clock: time since start, frozen once the session finishes.
    pub fn elapsed(&self) -> Duration {
        match self.state.as_ref() {
            Some(state) => match state.summary.as_ref() {
                Some(summary) => summary.elapsed,
                None => self.clock.now().saturating_sub(state.session_started_at),
            },
            None => Duration::ZERO,
        }
    }

    /// Time the current word has been on screen.
    pub fn word_elapsed(&self) -> Duration {
        self.state.as_ref().map_or(Duration::ZERO, |s| {
            self.clock.now().saturating_sub(s.word_started_at)
        })
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start_session(&mut self, settings: &SessionSettings) -> Result<(), SessionError> {
        let mut rng = rand::thread_rng();
        self.start_session_with_rng(settings, &mut rng)
    }

    pub fn start_session_with_rng<R: Rng + ?Sized>(
        &mut self,
        settings: &SessionSettings,
        rng: &mut R,
    ) -> Result<(), SessionError> {
        if self.phase() != Phase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        let config = SessionConfig::from_settings(settings, rng)?;
        let now = self.clock.now();

        info!(
            words = config.word_list.len(),
            source = ?config.word_list.source(),
            mode = %config.input_mode,
            time_limit = config.per_word_time_limit_secs,
            "session started"
        );

        self.events.push(SessionEvent::SessionStarted {
            total_words: config.word_list.len(),
        });
        self.events.push(SessionEvent::Cue(Cue::SessionStart));
        self.events.push(SessionEvent::ScoreChanged(0));
        self.config = Some(config);
        self.state = Some(SessionState::new(now));
        self.present_current_word(now);
        Ok(())
    }

    /// Typed mode: check an answer against the current word.
    pub fn submit_answer(&mut self, text: &str) -> Result<AnswerOutcome, SessionError> {
        let now = self.clock.now();
        let answer_time = self.word_elapsed();
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        if config.input_mode != InputMode::Typed {
            return Err(SessionError::WrongInputMode(config.input_mode));
        }
        if state.word_resolved {
            return Err(SessionError::WordResolved);
        }

        let word = resolve_current_word(config, state);
        let correct = text.trim().to_lowercase() == word.to_lowercase();
        let (outcome, feedback, cue, delay) = if correct {
            state.score += 1;
            (
                AnswerOutcome::Correct,
                Feedback::Correct,
                Cue::Correct,
                self.grace.correct,
            )
        } else {
            (
                AnswerOutcome::Incorrect,
                Feedback::Incorrect { answer: word },
                Cue::Incorrect,
                self.grace.incorrect,
            )
        };
        state.feedback = Some(feedback.clone());
        debug!(
            index = state.current_index,
            ?outcome,
            answer_ms = answer_time.as_millis() as u64,
            "answer submitted"
        );

        self.events.push(SessionEvent::Cue(cue));
        self.events.push(SessionEvent::FeedbackChanged(Some(feedback)));
        self.events.push(SessionEvent::ScoreChanged(state.score));
        self.schedule_advance(now, delay);
        Ok(outcome)
    }

    /// Typed mode: reveal one more leading letter of the current word.
    pub fn request_hint(&mut self) -> Result<HintOutcome, SessionError> {
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        if config.input_mode != InputMode::Typed {
            return Err(SessionError::WrongInputMode(config.input_mode));
        }
        if state.word_resolved {
            return Err(SessionError::WordResolved);
        }

        let (outcome, feedback) = if state.hints_used < MAX_HINTS {
            state.hints_used += 1;
            let prefix: String = config.word_list[state.current_index]
                .chars()
                .take(usize::from(state.hints_used))
                .collect();
            (
                HintOutcome::Revealed(prefix.clone()),
                Feedback::Hint { prefix },
            )
        } else {
            (HintOutcome::Exhausted, Feedback::NoMoreHints)
        };
        state.feedback = Some(feedback.clone());

        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        self.events.push(SessionEvent::FeedbackChanged(Some(feedback)));
        Ok(outcome)
    }

    /// Typed mode: give up on the current word without scoring it.
    pub fn skip_word(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        if config.input_mode != InputMode::Typed {
            return Err(SessionError::WrongInputMode(config.input_mode));
        }
        if state.word_resolved {
            return Err(SessionError::WordResolved);
        }

        let answer = resolve_current_word(config, state);
        let feedback = Feedback::Skipped { answer };
        state.feedback = Some(feedback.clone());
        debug!(index = state.current_index, "word skipped");

        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        self.events.push(SessionEvent::FeedbackChanged(Some(feedback)));
        self.schedule_advance(now, self.grace.skipped);
        Ok(())
    }

    /// Paper mode: the learner has written the word and wants the next one.
    pub fn advance_manually(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        if config.input_mode != InputMode::Paper {
            return Err(SessionError::WrongInputMode(config.input_mode));
        }
        if state.word_resolved {
            return Err(SessionError::WordResolved);
        }

        resolve_current_word(config, state);
        debug!(index = state.current_index, "advanced manually");

        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        self.advance_word(now);
        Ok(())
    }

    /// Paper mode: show the correct spelling, then move on after a pause.
    pub fn reveal_answer(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        if config.input_mode != InputMode::Paper {
            return Err(SessionError::WrongInputMode(config.input_mode));
        }
        if state.word_resolved {
            return Err(SessionError::WordResolved);
        }

        let answer = resolve_current_word(config, state);
        let feedback = Feedback::Revealed { answer };
        state.feedback = Some(feedback.clone());
        let is_last = state.current_index + 1 >= config.word_list.len();

        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        self.events.push(SessionEvent::FeedbackChanged(Some(feedback)));
        if is_last {
            self.events.push(SessionEvent::UploadReady);
        }
        self.schedule_advance(now, self.grace.revealed);
        Ok(())
    }

    /// Ask for the current word to be spoken again.
    pub fn replay_word(&mut self) -> Result<(), SessionError> {
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        let word = config.word_list[state.current_index].clone();
        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        self.events.push(SessionEvent::Speak(word));
        Ok(())
    }

    /// Stop presenting words. Paper sessions with answers on paper still
    /// go through validation.
    pub fn end_early(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let (config, state) = presenting_parts(&self.config, &mut self.state)?;
        state.cancel_timers();
        let needs_validation =
            config.input_mode == InputMode::Paper && !state.presented_words.is_empty();
        info!(
            presented = state.presented_words.len(),
            total = config.word_list.len(),
            "session ended early"
        );

        self.events.push(SessionEvent::Cue(Cue::ControlClick));
        if needs_validation {
            self.enter_awaiting_validation();
        } else {
            self.finish(now);
        }
        Ok(())
    }

    /// Run every countdown tick and deferred transition that is due.
    pub fn tick(&mut self) {
        loop {
            let now = self.clock.now();
            let Some(state) = self.state.as_ref() else {
                return;
            };
            if !state.phase.is_presenting() {
                return;
            }

            let countdown_due = state
                .countdown
                .as_ref()
                .map(Countdown::next_tick_at)
                .filter(|at| *at <= now);
            let pending_due = state
                .pending
                .as_ref()
                .filter(|p| p.is_due(now))
                .map(|p| p.due);

            match (countdown_due, pending_due) {
                (None, None) => return,
                (Some(countdown_at), Some(pending_at)) if pending_at <= countdown_at => {
                    self.run_deferred()
                }
                (Some(_), _) => self.countdown_tick(),
                (None, Some(_)) => self.run_deferred(),
            }
        }
    }

    /// Hand the presented words to the validation transport. Only one
    /// request may be in flight per session.
    pub fn begin_validation(
        &mut self,
        images: Vec<String>,
    ) -> Result<ValidationRequest, SessionError> {
        let state = awaiting_parts(&mut self.state)?;
        if state.validation_in_flight.is_some() {
            return Err(SessionError::ValidationInFlight);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        state.validation_in_flight = Some(ticket);
        info!(ticket, words = state.presented_words.len(), "validation requested");

        self.events.push(SessionEvent::ValidationStarted { ticket });
        Ok(ValidationRequest {
            ticket,
            images,
            words: state.presented_words.clone(),
        })
    }

    /// Apply the transport's answer for `ticket` and finish the session.
    pub fn complete_validation(
        &mut self,
        ticket: u64,
        outcome: Result<String, ValidationError>,
    ) -> Result<(), SessionError> {
        let state = awaiting_parts(&mut self.state)?;
        if state.validation_in_flight != Some(ticket) {
            return Err(SessionError::StaleValidation(ticket));
        }
        state.validation_in_flight = None;

        let parsed =
            outcome.and_then(|body| parse_validation_response(&body, &state.presented_words));
        self.apply_validation(parsed);
        Ok(())
    }

    /// Give up on validation before a request went out (no photo, no
    /// endpoint) and finish with the failure recorded.
    pub fn fail_validation(&mut self, error: ValidationError) -> Result<(), SessionError> {
        let state = awaiting_parts(&mut self.state)?;
        if state.validation_in_flight.is_some() {
            return Err(SessionError::ValidationInFlight);
        }
        self.apply_validation(Err(error));
        Ok(())
    }

    /// Drop the session entirely and return to idle.
    pub fn reset(&mut self) {
        if self.state.is_some() {
            debug!("session reset");
        }
        self.state = None;
        self.config = None;
        self.events.clear();
        self.events.push(SessionEvent::Reset);
    }

    fn present_current_word(&mut self, at: Duration) {
        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return;
        };
        let index = state.current_index;
        let word = config.word_list[index].clone();
        let countdown = Countdown::start(config.per_word_time_limit_secs, at);

        state.phase = Phase::Running(RunningPhase::Presenting);
        state.hints_used = 0;
        state.word_resolved = false;
        state.feedback = None;
        state.word_started_at = at;
        state.pending = None;
        debug!(index, "presenting word");

        self.events.extend([
            SessionEvent::FeedbackChanged(None),
            SessionEvent::WordPresented {
                index,
                total: config.word_list.len(),
            },
            SessionEvent::Speak(word),
            SessionEvent::CountdownTick {
                remaining: countdown.remaining(),
                warning: countdown.is_warning(),
            },
        ]);
        state.countdown = Some(countdown);
    }

    fn schedule_advance(&mut self, at: Duration, delay: Duration) {
        if delay.is_zero() {
            self.advance_word(at);
        } else if let Some(state) = self.state.as_mut() {
            state.pending = Some(Deferred::new(at, delay, DeferredAction::AdvanceWord));
        }
    }

    fn advance_word(&mut self, at: Duration) {
        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return;
        };
        let total = config.word_list.len();
        let mode = config.input_mode;
        state.cancel_timers();
        state.current_index = (state.current_index + 1).min(total);

        if state.current_index < total {
            self.present_current_word(at);
            return;
        }
        match mode {
            InputMode::Typed => self.finish(at),
            InputMode::Paper => self.enter_awaiting_validation(),
        }
    }

    fn countdown_tick(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(countdown) = state.countdown.as_mut() else {
            return;
        };
        let at = countdown.next_tick_at();
        let remaining = countdown.tick();
        let warning = countdown.is_warning();
        let expired = countdown.is_expired();

        self.events
            .push(SessionEvent::CountdownTick { remaining, warning });
        if (1..=CUE_THRESHOLD_SECS).contains(&remaining) {
            self.events.push(SessionEvent::Cue(Cue::CountdownWarning));
        }
        if expired {
            state.countdown = None;
            self.word_time_expired(at);
        }
    }

    fn word_time_expired(&mut self, at: Duration) {
        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return;
        };
        let mode = config.input_mode;
        let answer = resolve_current_word(config, state);
        debug!(index = state.current_index, %mode, "word time expired");

        match mode {
            InputMode::Typed => {
                let feedback = Feedback::TimeExpired { answer };
                state.feedback = Some(feedback.clone());
                self.events
                    .push(SessionEvent::FeedbackChanged(Some(feedback)));
                self.schedule_advance(at, self.grace.expired);
            }
            InputMode::Paper => self.advance_word(at),
        }
    }

    fn run_deferred(&mut self) {
        let Some(deferred) = self.state.as_mut().and_then(|s| s.pending.take()) else {
            return;
        };
        match deferred.action {
            DeferredAction::AdvanceWord => self.advance_word(deferred.due),
        }
    }

    fn enter_awaiting_validation(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.cancel_timers();
        state.phase = Phase::Running(RunningPhase::AwaitingValidation);
        state.feedback = None;
        info!(
            presented = state.presented_words.len(),
            "awaiting handwriting validation"
        );

        self.events.push(SessionEvent::FeedbackChanged(None));
        self.events.push(SessionEvent::PhotoRequested {
            words: state.presented_words.clone(),
        });
    }

    fn apply_validation(&mut self, result: Result<ValidationResult, ValidationError>) {
        let now = self.clock.now();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match result {
            Ok(result) => {
                info!(
                    correct = result.total_correct,
                    total = result.total_words,
                    "validation succeeded"
                );
                state.score = result.total_correct;
                state.validation = Some(result);
            }
            Err(error) => {
                warn!("validation failed: {error}");
                state.score = 0;
                state.validation = Some(ValidationResult::placeholder(&state.presented_words));
                state.validation_error = Some(error);
            }
        }
        self.events.push(SessionEvent::ScoreChanged(state.score));
        self.finish(now);
    }

    fn finish(&mut self, at: Duration) {
        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return;
        };
        state.cancel_timers();
        state.phase = Phase::Finished;

        let summary = SessionSummary {
            score: state.score,
            total_words_presented: state.presented_words.len(),
            total_words: config.word_list.len(),
            elapsed: at.saturating_sub(state.session_started_at),
            started_at: state.started_at,
            input_mode: config.input_mode,
            validation: state.validation.clone(),
            validation_error: state.validation_error.clone(),
        };
        info!(
            score = summary.score,
            presented = summary.total_words_presented,
            elapsed_secs = summary.elapsed.as_secs(),
            "session finished"
        );
        state.summary = Some(summary);
        self.events.push(SessionEvent::Finished);
    }
}
