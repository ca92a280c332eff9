use crate::error::ApiError;

/// Maximum text length for a processing request
const MAX_TEXT_LENGTH: usize = 50_000;

/// Accepted voice modes. The distinction is informational only: both modes
/// pass every uploaded file to the synthesizer identically.
const VOICE_MODES: [&str; 2] = ["Single Speaker", "Multiple Speakers"];

/// Validate a voice processing request before any synthesis work starts
pub fn validate_process_request(
    text: &str,
    voice_mode: &str,
    speaker_file_count: usize,
) -> Result<(), ApiError> {
    if speaker_file_count == 0 {
        return Err(ApiError::InvalidInput(
            "No speaker files uploaded".to_string(),
        ));
    }

    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "No text content provided".to_string(),
        ));
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_LENGTH
        )));
    }

    if !VOICE_MODES.contains(&voice_mode) {
        return Err(ApiError::InvalidInput(format!(
            "Unknown voice mode: {}. Expected one of: {}",
            voice_mode,
            VOICE_MODES.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_process_request_valid() {
        assert!(validate_process_request("Hello", "Single Speaker", 1).is_ok());
        assert!(validate_process_request("Hello", "Multiple Speakers", 3).is_ok());
    }

    #[test]
    fn test_validate_process_request_no_speakers() {
        let result = validate_process_request("Hello", "Single Speaker", 0);
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("speaker"));
        }
    }

    #[test]
    fn test_validate_process_request_blank_text() {
        for text in ["", "   ", "\n\n"] {
            let result = validate_process_request(text, "Single Speaker", 1);
            assert!(result.is_err());
            if let Err(ApiError::InvalidInput(msg)) = result {
                assert!(msg.contains("text"));
            }
        }
    }

    #[test]
    fn test_validate_process_request_too_long() {
        let long_text = "a".repeat(MAX_TEXT_LENGTH + 1);
        let result = validate_process_request(&long_text, "Single Speaker", 1);
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("too long"));
        }
    }

    #[test]
    fn test_validate_process_request_unknown_voice_mode() {
        let result = validate_process_request("Hello", "Choir", 1);
        assert!(result.is_err());

        // File counts are not enforced per mode.
        assert!(validate_process_request("Hello", "Multiple Speakers", 1).is_ok());
        assert!(validate_process_request("Hello", "Single Speaker", 5).is_ok());
    }
}
