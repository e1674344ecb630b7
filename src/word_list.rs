use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;
use std::ops::Deref;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

const DEFAULT_WORDS_FILE: &str = "default.json";

/// Embedded word file: a name, its size and the words themselves
#[derive(Deserialize, Clone, Debug)]
pub struct WordFile {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

fn read_word_file(file_name: &str) -> Result<WordFile, Box<dyn Error>> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("word file {file_name} not found"))?;
    let contents = file
        .contents_utf8()
        .ok_or_else(|| format!("word file {file_name} is not utf-8"))?;
    Ok(from_str(contents)?)
}

/// The built-in practice words, in their shipped order.
pub fn default_words() -> Vec<String> {
    match read_word_file(DEFAULT_WORDS_FILE) {
        Ok(file) => file.words,
        Err(e) => {
            tracing::warn!("failed to load built-in word list: {e}");
            Vec::new()
        }
    }
}

fn is_spellable(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic())
}

/// Split free-form user text into candidate words.
///
/// Tokens are separated by runs of commas and line breaks; anything that
/// is not purely ASCII letters is dropped. Surviving words are lowercased.
pub fn parse_word_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| matches!(c, ',' | '\n' | '\r'))
        .map(str::trim)
        .filter(|token| is_spellable(token))
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Where the session's words came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    Custom,
    Default,
}

/// Ordered, non-empty list of words for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
    source: WordSource,
}

impl WordList {
    /// Build the session's word list.
    ///
    /// Falls back to the built-in list (shuffled first when `random`, then
    /// cut to `default_count`) when `text` yields no usable words.
    pub fn from_source<R: Rng + ?Sized>(
        text: &str,
        default_count: usize,
        random: bool,
        rng: &mut R,
    ) -> Self {
        let custom = parse_word_list(text);
        let (mut words, source) = if custom.is_empty() {
            let mut defaults = default_words();
            if random {
                defaults.shuffle(rng);
            }
            defaults.truncate(default_count.max(1));
            (defaults, WordSource::Default)
        } else {
            let mut custom = custom;
            if random {
                custom.shuffle(rng);
            }
            (custom, WordSource::Custom)
        };

        // the embedded file is compiled in, but never hand out an empty list
        if words.is_empty() {
            words.push("spelling".to_string());
        }

        Self { words, source }
    }

    pub fn source(&self) -> WordSource {
        self.source
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Deref for WordList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}
