//! Input validation for embedding requests.

use crate::errors::ApiError;

/// Maximum number of texts per request.
pub const MAX_BATCH_SIZE: usize = 2_048;

/// Maximum length of a single text (1 MB).
pub const MAX_TEXT_LENGTH: usize = 1_048_576;

/// Validate an incoming batch before any decryption or encoding work.
///
/// An empty batch is valid: the endpoints answer it with an empty matrix
/// without touching the model.
pub fn validate_batch(texts: &[String]) -> Result<(), ApiError> {
    if texts.len() > MAX_BATCH_SIZE {
        return Err(ApiError::Validation(format!(
            "Batch exceeds maximum size ({} > {MAX_BATCH_SIZE})",
            texts.len()
        )));
    }
    for (index, text) in texts.iter().enumerate() {
        if text.len() > MAX_TEXT_LENGTH {
            return Err(ApiError::Validation(format!(
                "Text at index {index} exceeds maximum length ({} > {MAX_TEXT_LENGTH})",
                text.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_valid() {
        assert!(validate_batch(&[]).is_ok());
    }

    #[test]
    fn normal_batch_is_valid() {
        let texts = vec!["hello".to_string(), "world".to_string()];
        assert!(validate_batch(&texts).is_ok());
    }

    #[test]
    fn batch_at_limit_is_valid() {
        let texts = vec!["x".to_string(); MAX_BATCH_SIZE];
        assert!(validate_batch(&texts).is_ok());
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let texts = vec!["x".to_string(); MAX_BATCH_SIZE + 1];
        let err = validate_batch(&texts).unwrap_err();
        assert!(err.to_string().contains("2049"));
    }

    #[test]
    fn text_at_limit_is_valid() {
        let texts = vec!["x".repeat(MAX_TEXT_LENGTH)];
        assert!(validate_batch(&texts).is_ok());
    }

    #[test]
    fn oversized_text_names_its_index() {
        let texts = vec!["ok".to_string(), "x".repeat(MAX_TEXT_LENGTH + 1)];
        let err = validate_batch(&texts).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}
