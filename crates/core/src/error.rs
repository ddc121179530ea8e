use thiserror::Error;

#[derive(Error, Debug)]
pub enum ElisumError {
    #[error("Extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Summarization service failed: {reason}")]
    Service { reason: String },
}

impl ElisumError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        ElisumError::Extraction {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ElisumError::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn service(reason: impl Into<String>) -> Self {
        ElisumError::Service {
            reason: reason.into(),
        }
    }

    /// Missing or malformed page content. Callers fall back to a "parsing failed" state for both.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            ElisumError::Extraction { .. } | ElisumError::MalformedResponse { .. }
        )
    }
}

impl From<quick_xml::Error> for ElisumError {
    fn from(err: quick_xml::Error) -> Self {
        ElisumError::malformed(format!("XML parse error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ElisumError>;
