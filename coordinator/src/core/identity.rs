//! Session identity derivation
//!
//! Pure functions mapping a free-form model preference to a session id and
//! its provider/model parts. No I/O.

use sha2::{Digest, Sha256};
use shared::{PreferenceParts, SessionId};

/// Number of hex characters kept from the digest
const SESSION_ID_LEN: usize = 8;

/// Derive the stable session id of a preference string
///
/// Blank input maps to `"default"`. Otherwise the id is a truncated SHA-256
/// digest, so two preferences may collide; that is not detected.
pub fn derive_session_id(preference: &str) -> SessionId {
    let preference = preference.trim();
    if preference.is_empty() {
        return SessionId::default_session();
    }

    let mut hasher = Sha256::new();
    hasher.update(preference.as_bytes());
    let digest = hasher.finalize();

    SessionId::new(hex_encode(&digest[..SESSION_ID_LEN / 2]))
}

/// Split a preference into provider and model
///
/// Tried in order: `provider,model`, then `provider/model`, then a bare
/// model name. Never fails.
pub fn parse_preference(preference: &str) -> PreferenceParts {
    let preference = preference.trim();
    if preference.is_empty() {
        return PreferenceParts::default();
    }

    let parts: Vec<&str> = preference.split(',').map(str::trim).collect();
    if let [provider, model] = parts.as_slice() {
        if !provider.is_empty() && !model.is_empty() {
            return PreferenceParts {
                provider: Some(provider.to_string()),
                model: Some(model.to_string()),
            };
        }
    }

    if parts.len() == 1 {
        if let Some((provider, model)) = preference.split_once('/') {
            let (provider, model) = (provider.trim(), model.trim());
            if !provider.is_empty() && !model.is_empty() {
                return PreferenceParts {
                    provider: Some(provider.to_string()),
                    model: Some(model.to_string()),
                };
            }
        }
    }

    PreferenceParts {
        provider: None,
        model: Some(preference.to_string()),
    }
}

/// Encodes bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_preference_is_default() {
        assert_eq!(derive_session_id("").as_str(), "default");
        assert_eq!(derive_session_id("   ").as_str(), "default");
    }

    #[test]
    fn test_session_id_is_stable_hex() {
        let first = derive_session_id("openrouter,gpt-4");
        let second = derive_session_id("openrouter,gpt-4");
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 8);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, derive_session_id("openrouter/gpt-4"));
    }

    #[test]
    fn test_session_id_known_value() {
        // sha256("abc") = ba7816bf...
        assert_eq!(derive_session_id("abc").as_str(), "ba7816bf");
    }

    #[test]
    fn test_parse_comma_form() {
        let parts = parse_preference("openrouter,gpt-4");
        assert_eq!(parts.provider.as_deref(), Some("openrouter"));
        assert_eq!(parts.model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_parse_slash_form() {
        let parts = parse_preference("openrouter/gpt-4");
        assert_eq!(parts.provider.as_deref(), Some("openrouter"));
        assert_eq!(parts.model.as_deref(), Some("gpt-4"));

        // Only the first slash separates provider from model
        let nested = parse_preference("openrouter/anthropic/claude-3");
        assert_eq!(nested.provider.as_deref(), Some("openrouter"));
        assert_eq!(nested.model.as_deref(), Some("anthropic/claude-3"));
    }

    #[test]
    fn test_parse_bare_model() {
        let parts = parse_preference("gpt-4");
        assert_eq!(parts.provider, None);
        assert_eq!(parts.model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_parse_is_soft_on_odd_input() {
        let three = parse_preference("a,b,c");
        assert_eq!(three.provider, None);
        assert_eq!(three.model.as_deref(), Some("a,b,c"));

        let dangling = parse_preference("openrouter,");
        assert_eq!(dangling.provider, None);
        assert_eq!(dangling.model.as_deref(), Some("openrouter,"));

        assert_eq!(parse_preference("  "), PreferenceParts::default());
    }
}
