use std::fmt;

/// Sound cues the tone collaborator can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Cue {
    Correct,
    Incorrect,
    CountdownWarning,
    SessionStart,
    ControlClick,
}

/// Message shown under the current word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { answer: String },
    TimeExpired { answer: String },
    Skipped { answer: String },
    Revealed { answer: String },
    Hint { prefix: String },
    NoMoreHints,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Correct => write!(f, "Correct! Well done!"),
            Feedback::Incorrect { answer } => {
                write!(f, "Incorrect. The correct spelling is: {answer}")
            }
            Feedback::TimeExpired { answer } => write!(f, "Time's up! The word was: {answer}"),
            Feedback::Skipped { answer } => write!(f, "Skipped. The word was: {answer}"),
            Feedback::Revealed { answer } => write!(f, "The word was: {answer}"),
            Feedback::Hint { prefix } => {
                write!(f, "Hint: Starts with \"{}\"", prefix.to_uppercase())
            }
            Feedback::NoMoreHints => write!(f, "No more hints available for this word!"),
        }
    }
}

/// Side-effect requests and notifications produced by the controller.
///
/// The front end drains these after every call and renders or plays them;
/// the controller never performs I/O itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SessionStarted { total_words: usize },
    WordPresented { index: usize, total: usize },
    Speak(String),
    Cue(Cue),
    CountdownTick { remaining: u32, warning: bool },
    FeedbackChanged(Option<Feedback>),
    ScoreChanged(usize),
    /// Paper mode: the last answer was revealed, photos can be prepared
    UploadReady,
    /// Paper mode: presentation is over, a photo of the answers is needed
    PhotoRequested { words: Vec<String> },
    ValidationStarted { ticket: u64 },
    Finished,
    Reset,
}
