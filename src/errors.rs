use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("upstream unavailable ({url}): {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("content not found: {0}")]
    ContentNotFound(String),

    #[error("episode not found: season {season}, episode {episode}")]
    EpisodeNotFound { season: String, episode: u32 },

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(&'static str),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("no decryption key for host '{0}'")]
    MissingKey(String),

    #[error("invalid content identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unknown supplier: {0}")]
    UnknownSupplier(String),
}

impl Error {
    pub fn upstream(url: &str, reason: impl ToString) -> Self {
        Error::UpstreamUnavailable {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Errors that mean the requested item does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ContentNotFound(_) | Error::EpisodeNotFound { .. }
        )
    }
}
