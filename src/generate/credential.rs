use log::debug;

use super::error::GenerationError;
use crate::runtime::Runtime;

/// Environment variable holding the Hugging Face access token.
pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

/// Value shipped in sample configuration; never a real token.
pub const PLACEHOLDER_API_KEY: &str = "hf_xxx";

/// Reads the API key at call time and rejects absent or placeholder values.
pub fn load_api_key<R: Runtime>(runtime: &R) -> Result<String, GenerationError> {
    let key = runtime
        .env_var(API_KEY_ENV)
        .map_err(|_| GenerationError::MissingCredential)?;
    let key = key.trim();

    if key.is_empty() || key == PLACEHOLDER_API_KEY {
        return Err(GenerationError::MissingCredential);
    }

    debug!("Using {} for authentication: {}", API_KEY_ENV, mask(key));
    Ok(key.to_string())
}

/// Shows only the ends of a token, e.g. `hf_***********wxyz`.
fn mask(token: &str) -> String {
    match (token.get(..3), token.get(token.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if token.len() > 12 => format!("{}***********{}", head, tail),
        _ => "********".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::configure_mock_api_key;

    #[test]
    fn test_load_api_key_present() {
        let mut runtime = MockRuntime::new();
        configure_mock_api_key(&mut runtime, Some("hf_abcdefghijklmnop"));

        assert_eq!(load_api_key(&runtime).unwrap(), "hf_abcdefghijklmnop");
    }

    #[test]
    fn test_load_api_key_missing() {
        let mut runtime = MockRuntime::new();
        configure_mock_api_key(&mut runtime, None);

        assert_eq!(load_api_key(&runtime), Err(GenerationError::MissingCredential));
    }

    #[test]
    fn test_load_api_key_placeholder_or_blank() {
        for value in ["hf_xxx", "", "   "] {
            let mut runtime = MockRuntime::new();
            configure_mock_api_key(&mut runtime, Some(value));

            assert_eq!(
                load_api_key(&runtime),
                Err(GenerationError::MissingCredential),
                "value {:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_mask_hides_middle() {
        assert_eq!(mask("hf_abcdefghijklmnop"), "hf_***********mnop");
        assert_eq!(mask("short"), "********");
    }
}
