// src/scoring/identity.rs

/// Decoded submitter identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityParts {
    /// May be empty when the respondent submitted anonymously.
    pub display_name: String,
    pub unique_suffix: String,
}

/// Builds the identity token stored with every response row.
///
/// Anonymous submissions (empty or whitespace-only display name) are keyed
/// by the suffix alone. The suffix is freshly generated per submission
/// event, so a respondent who takes the quiz twice gets two identities.
pub fn encode(display_name: &str, unique_suffix: &str) -> String {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        unique_suffix.to_string()
    } else {
        format!("{trimmed}:{unique_suffix}")
    }
}

/// Splits a token back into its parts at the first ':'.
///
/// A token without a separator is all suffix. A display name that itself
/// contains ':' mis-splits here; the token format does not escape it.
pub fn decode(token: &str) -> IdentityParts {
    match token.split_once(':') {
        Some((name, suffix)) => IdentityParts {
            display_name: name.to_string(),
            unique_suffix: suffix.to_string(),
        },
        None => IdentityParts {
            display_name: String::new(),
            unique_suffix: token.to_string(),
        },
    }
}

/// Display form of a token: the encoded name, or the raw token when there
/// is no separator to strip.
pub fn display_name_of(token: &str) -> &str {
    match token.split_once(':') {
        Some((name, _)) => name,
        None => token,
    }
}
