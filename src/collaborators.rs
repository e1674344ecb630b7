use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crate::events::Cue;

/// Reads a word aloud. Best effort: implementations swallow every failure.
pub trait Speaker {
    fn speak(&self, word: &str);
}

/// Plays a short feedback sound for a cue. Best effort as well.
pub trait CuePlayer {
    fn play(&self, cue: Cue);
}

/// Speaks through whichever system TTS command is installed
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    programs: Vec<(String, Vec<String>)>,
}

impl CommandSpeaker {
    pub fn new() -> Self {
        Self {
            programs: vec![
                ("espeak".to_string(), vec!["-s".into(), "120".into()]),
                ("say".to_string(), vec!["-r".into(), "140".into()]),
            ],
        }
    }

    pub fn with_programs(programs: Vec<(String, Vec<String>)>) -> Self {
        Self { programs }
    }
}

impl Default for CommandSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSpeaker {
    /// Start the first available program for `word`. The child is waited on
    /// from a background thread so it never lingers as a zombie.
    fn launch(&self, word: &str) -> Option<JoinHandle<Option<ExitStatus>>> {
        for (program, args) in &self.programs {
            let spawned = Command::new(program)
                .args(args)
                .arg(word)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(mut child) => return Some(thread::spawn(move || child.wait().ok())),
                Err(e) => tracing::trace!(program = %program, "speech command unavailable: {e}"),
            }
        }
        None
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, word: &str) {
        self.launch(word);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _word: &str) {}
}

/// Rings the terminal bell for the cues that need attention
#[derive(Debug, Clone, Copy, Default)]
pub struct BellCuePlayer;

impl BellCuePlayer {
    pub fn rings_for(cue: Cue) -> bool {
        matches!(cue, Cue::Incorrect | Cue::CountdownWarning)
    }
}

impl CuePlayer for BellCuePlayer {
    fn play(&self, cue: Cue) {
        if Self::rings_for(cue) {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCuePlayer;

impl CuePlayer for SilentCuePlayer {
    fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_speech_program_is_ignored() {
        let speaker = CommandSpeaker::with_programs(vec![(
            "definitely-not-a-tts-binary".to_string(),
            vec![],
        )]);
        // must not panic or error
        speaker.speak("hello");
    }

    #[test]
    fn test_missing_programs_launch_nothing() {
        let speaker = CommandSpeaker::with_programs(vec![]);
        assert!(speaker.launch("hello").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_speech_process_is_reaped() {
        let speaker = CommandSpeaker::with_programs(vec![
            ("definitely-not-a-tts-binary".to_string(), vec![]),
            ("true".to_string(), vec![]),
        ]);
        let status = speaker.launch("hello").unwrap().join().unwrap();
        assert!(status.unwrap().success());
    }

    #[test]
    fn test_default_speaker_programs() {
        let speaker = CommandSpeaker::default();
        assert_eq!(speaker.programs.len(), 2);
        assert_eq!(speaker.programs[0].0, "espeak");
    }

    #[test]
    fn test_bell_rings_only_for_attention_cues() {
        assert!(BellCuePlayer::rings_for(Cue::Incorrect));
        assert!(BellCuePlayer::rings_for(Cue::CountdownWarning));
        assert!(!BellCuePlayer::rings_for(Cue::Correct));
        assert!(!BellCuePlayer::rings_for(Cue::SessionStart));
        assert!(!BellCuePlayer::rings_for(Cue::ControlClick));
    }

    #[test]
    fn test_silent_collaborators() {
        SilentSpeaker.speak("word");
        SilentCuePlayer.play(Cue::Correct);
    }
}
