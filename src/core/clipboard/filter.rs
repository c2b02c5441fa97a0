use log::warn;
use regex::Regex;
use std::sync::OnceLock;

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Longer pastes are treated as documents and not scanned
const MAX_SCANNED_LEN: usize = 10_000;

fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // GitHub Personal Access Token
            r"ghp_[a-zA-Z0-9]{36}",
            // Stripe Live Key
            r"sk_live_[a-zA-Z0-9]{24}",
            // Slack Token
            r"xox[baprs]-[a-zA-Z0-9]{10,48}",
            // AWS Access Key ID
            r"AKIA[0-9A-Z]{16}",
            // Google API Key
            r"AIza[0-9A-Za-z\-_]{35}",
            // Generic Private Key Block
            r"-----BEGIN (RSA |DSA |EC |PGP |OPENSSH )?PRIVATE KEY( BLOCK)?-----",
        ]
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("[ClipboardFilter] Skipping invalid pattern: {}", e);
                None
            }
        })
        .collect()
    })
}

/// Check if text content looks like a credential that should never be stored
pub fn is_sensitive(content: &str) -> bool {
    if content.len() > MAX_SCANNED_LEN {
        return false;
    }

    // Never log the content or which pattern matched
    get_secret_patterns().iter().any(|pattern| pattern.is_match(content))
}
