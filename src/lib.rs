// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod events;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod util;
pub mod validation;
pub mod validator;
pub mod word_list;

pub use controller::{SessionController, SessionError};
pub use events::{Cue, Feedback, SessionEvent};
pub use session::{InputMode, Phase, RunningPhase, SessionSettings};
