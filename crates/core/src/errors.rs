use thiserror::Error;

/// Failure reported by an external collaborator (chat API, quote API, store, link checker).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already performed: {0}")]
    AlreadyDone(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),
    #[error("api error: {0}")]
    Api(String),
}

impl CollaboratorError {
    /// Outcomes that mean the requested effect already exists and callers treat as success.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyDone(_) | Self::UniquenessViolation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unavailable(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("handler precondition failed: {0}")]
    Precondition(String),
    #[error("handler failure: {0}")]
    Execution(String),
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}` for rule `{rule}`: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule `{rule}` declares more than one subtype constraint")]
    ConflictingSubtype { rule: String },
}
