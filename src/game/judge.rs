//! Mr. White guess judging
//!
//! A judge decides whether a free-text guess names the secret word. The
//! remote judge asks a semantic-equality service over HTTP; when that fails
//! the fallback compares trimmed, case-folded strings. Judging may be slow,
//! so the round loop runs it on a worker thread and polls for the verdict.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Why a judge could not produce a verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    /// Request never completed (connect, timeout, TLS, ...)
    Transport(String),
    /// Service answered with a non-success status
    Status(u16),
    /// Service answered with something that is not a verdict
    MalformedResponse(String),
    /// Worker thread went away before answering
    Disconnected,
}

impl fmt::Display for JudgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeError::Transport(e) => write!(f, "request failed: {}", e),
            JudgeError::Status(code) => write!(f, "service returned status {}", code),
            JudgeError::MalformedResponse(e) => write!(f, "unreadable verdict: {}", e),
            JudgeError::Disconnected => write!(f, "judge worker stopped"),
        }
    }
}

impl std::error::Error for JudgeError {}

/// Decides whether `guess` names `secret_word`
pub trait GuessJudge: Send + Sync {
    fn judge(&self, secret_word: &str, guess: &str) -> Result<bool, JudgeError>;
}

/// Case-insensitive, whitespace-trimmed exact equality
pub fn exact_match(secret_word: &str, guess: &str) -> bool {
    secret_word.trim().to_lowercase() == guess.trim().to_lowercase()
}

/// Offline judge using [`exact_match`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactJudge;

impl GuessJudge for ExactJudge {
    fn judge(&self, secret_word: &str, guess: &str) -> Result<bool, JudgeError> {
        Ok(exact_match(secret_word, guess))
    }
}

#[derive(Debug, Serialize)]
struct VerdictRequest<'a> {
    secret_word: &'a str,
    guess: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerdictResponse {
    #[serde(alias = "isCorrect")]
    is_correct: bool,
}

/// Judge backed by a remote semantic-equality service.
///
/// `POST {endpoint}` with `{"secret_word": .., "guess": ..}`, expecting
/// `{"is_correct": bool}` back.
pub struct RemoteJudge {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteJudge {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, JudgeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("undercover/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GuessJudge for RemoteJudge {
    fn judge(&self, secret_word: &str, guess: &str) -> Result<bool, JudgeError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&VerdictRequest { secret_word, guess });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(JudgeError::Status(resp.status().as_u16()));
        }
        let verdict: VerdictResponse = resp
            .json()
            .map_err(|e| JudgeError::MalformedResponse(e.to_string()))?;
        Ok(verdict.is_correct)
    }
}

/// Wraps a judge so that any failure degrades to [`exact_match`].
pub struct FallbackJudge<J> {
    inner: J,
}

impl<J: GuessJudge> FallbackJudge<J> {
    pub fn new(inner: J) -> Self {
        Self { inner }
    }

    /// The wrapped judge, for callers that need to tell "service down"
    /// apart from "service said no".
    pub fn inner(&self) -> &J {
        &self.inner
    }
}

impl<J: GuessJudge> GuessJudge for FallbackJudge<J> {
    fn judge(&self, secret_word: &str, guess: &str) -> Result<bool, JudgeError> {
        match self.inner.judge(secret_word, guess) {
            Ok(verdict) => Ok(verdict),
            Err(e) => {
                tracing::warn!(error = %e, "judge failed, using exact match");
                Ok(exact_match(secret_word, guess))
            }
        }
    }
}

/// A verdict being computed on a worker thread
pub struct PendingVerdict {
    rx: Receiver<Result<bool, JudgeError>>,
}

impl PendingVerdict {
    /// Start judging in the background.
    pub fn spawn(judge: Arc<dyn GuessJudge>, secret_word: String, guess: String) -> Self {
        let (tx, rx) = channel();
        thread::spawn(move || {
            let verdict = judge.judge(&secret_word, &guess);
            // Receiver may already be gone if the round moved on.
            let _ = tx.send(verdict);
        });
        Self { rx }
    }

    /// Non-blocking check for the verdict.
    pub fn poll(&self) -> Option<Result<bool, JudgeError>> {
        match self.rx.try_recv() {
            Ok(verdict) => Some(verdict),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(JudgeError::Disconnected)),
        }
    }
}
