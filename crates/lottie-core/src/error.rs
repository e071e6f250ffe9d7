use thiserror::Error;

use crate::compatibility::CompatibilityIssue;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Unsupported animation feature: {0}")]
    Compatibility(CompatibilityIssue),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Failed to decode asset {id}: {reason}")]
    AssetDecoding { id: String, reason: String },
    #[error(transparent)]
    Decode(#[from] lottie_data::DecodeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    pub fn invalid_document(message: impl Into<String>) -> Self {
        CompileError::InvalidDocument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes() {
        let issue = CompatibilityIssue::new("Merge paths are not supported", "Layer.Group");
        assert_eq!(
            CompileError::Compatibility(issue).to_string(),
            "Unsupported animation feature: [Layer.Group] Merge paths are not supported"
        );
        assert!(CompileError::invalid_document("no layers")
            .to_string()
            .starts_with("Invalid document:"));
    }
}
