use serde::{Deserialize, Serialize};

/// Written form recorded for every word when validation could not be done
pub const PLACEHOLDER_WRITTEN_FORM: &str = "?";

/// One validation call: photos of the answer sheet plus the words that were
/// actually shown, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRequest {
    #[serde(skip)]
    pub ticket: u64,
    pub images: Vec<String>,
    pub words: Vec<String>,
}

/// Verdict on one handwritten word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordVerdict {
    pub word: String,
    pub is_correct: bool,
    pub written_form: String,
}

/// Outcome of the external handwriting check for a paper-mode session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub results: Vec<WordVerdict>,
    pub total_correct: usize,
    pub total_words: usize,
}

impl ValidationResult {
    /// Every presented word marked wrong, used when validation failed.
    pub fn placeholder(presented: &[String]) -> Self {
        Self {
            results: presented
                .iter()
                .map(|word| WordVerdict {
                    word: word.clone(),
                    is_correct: false,
                    written_form: PLACEHOLDER_WRITTEN_FORM.to_string(),
                })
                .collect(),
            total_correct: 0,
            total_words: presented.len(),
        }
    }

    fn check_shape(&self, presented: &[String]) -> Result<(), ValidationError> {
        if self.total_words != presented.len() {
            return Err(ValidationError::Malformed(format!(
                "expected {} words, response covers {}",
                presented.len(),
                self.total_words
            )));
        }
        if self.results.len() != self.total_words {
            return Err(ValidationError::Malformed(format!(
                "totalWords is {} but {} results were returned",
                self.total_words,
                self.results.len()
            )));
        }
        if self.total_correct > self.total_words {
            return Err(ValidationError::Malformed(format!(
                "totalCorrect {} exceeds totalWords {}",
                self.total_correct, self.total_words
            )));
        }
        if let Some((position, (verdict, word))) = self
            .results
            .iter()
            .zip(presented)
            .enumerate()
            .find(|(_, (verdict, word))| !verdict.word.eq_ignore_ascii_case(word))
        {
            return Err(ValidationError::Malformed(format!(
                "result {position} grades {:?}, expected {word:?}",
                verdict.word
            )));
        }
        let marked_correct = self.results.iter().filter(|v| v.is_correct).count();
        if marked_correct != self.total_correct {
            return Err(ValidationError::Malformed(format!(
                "totalCorrect is {} but {marked_correct} results are marked correct",
                self.total_correct
            )));
        }
        Ok(())
    }
}

/// Why an external validation attempt produced no usable result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("validation service rejected the credentials")]
    Auth,
    #[error("validation service quota or billing limit reached")]
    Quota,
    #[error("validation service rate limit hit")]
    RateLimited,
    #[error("validation service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed validation response: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Classify a non-success HTTP status from the validation endpoint.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ValidationError::Auth,
            402 => ValidationError::Quota,
            429 => {
                let body = body.to_ascii_lowercase();
                if body.contains("quota") || body.contains("billing") {
                    ValidationError::Quota
                } else {
                    ValidationError::RateLimited
                }
            }
            500..=599 => ValidationError::Unavailable(format!("server returned {status}")),
            _ => ValidationError::Malformed(format!("unexpected status {status}")),
        }
    }

    /// Text shown to the learner on the summary screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::Auth => {
                "Could not check your answers: the validation service key was rejected."
            }
            ValidationError::Quota => {
                "Could not check your answers: the validation service is out of quota."
            }
            ValidationError::RateLimited => {
                "Could not check your answers: too many requests, try again in a minute."
            }
            ValidationError::Unavailable(_) => {
                "Could not check your answers: the validation service is unavailable."
            }
            ValidationError::Malformed(_) => {
                "Could not check your answers: the validation response was unreadable."
            }
        }
    }
}

/// Peel a markdown code fence off a response body, if there is one.
fn strip_code_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. `json`) on the opening fence line
    match inner.split_once('\n') {
        Some((_, content)) => content.trim(),
        None => inner.trim(),
    }
}

/// Parse and check a validation response against the words actually shown.
pub fn parse_validation_response(
    body: &str,
    presented: &[String],
) -> Result<ValidationResult, ValidationError> {
    let result: ValidationResult = serde_json::from_str(strip_code_fence(body))
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    result.check_shape(presented)?;
    Ok(result)
}
