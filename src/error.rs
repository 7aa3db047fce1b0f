use thiserror::Error;

pub type Result<T, E = SeoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SeoError {
    #[error("invalid input: {0}")]
    Validation(String),

    /// The provider call failed or its payload did not match the expected shape.
    #[error("Failed to {action}: {message}")]
    Generation {
        action: &'static str,
        message: String,
    },

    /// One locale of a multi-locale generation failed; the whole set is discarded.
    #[error("Failed to generate article: locale {locale} failed ({requested} requested): {message}")]
    PartialLocaleFailure {
        locale: String,
        requested: usize,
        message: String,
    },

    #[error("API Error: {status} - {body}")]
    Persistence { status: u16, body: String },

    #[error("storage backend request failed: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("No article content available to save.")]
    NoContent,

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl SeoError {
    pub fn generation(action: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Generation {
            action,
            message: err.to_string(),
        }
    }

    /// True for any failure that aborts a generation as a whole.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::Generation { .. } | Self::PartialLocaleFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_includes_status_and_body() {
        let err = SeoError::Persistence {
            status: 503,
            body: "maintenance".to_owned(),
        };
        assert_eq!(err.to_string(), "API Error: 503 - maintenance");
    }

    #[test]
    fn partial_locale_failure_counts_as_generation_failure() {
        let err = SeoError::PartialLocaleFailure {
            locale: "fr-FR".to_owned(),
            requested: 3,
            message: "boom".to_owned(),
        };
        assert!(err.is_generation_failure());
        assert!(err.to_string().starts_with("Failed to generate article"));
        assert!(!SeoError::NoContent.is_generation_failure());
    }

    #[test]
    fn storage_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("write article");
        let err = SeoError::from(inner);
        assert_eq!(err.to_string(), "storage error: write article: disk full");
    }
}
