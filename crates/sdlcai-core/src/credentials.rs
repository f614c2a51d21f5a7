use crate::error::Result;
use crate::paths;
use std::path::Path;

/// Request credentials: the user's bearer token (managed by the login flow,
/// read here only) and the static API key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub token: Option<String>,
    pub api_key: Option<String>,
}

impl Credentials {
    /// Read the token from `<state_dir>/token`. `env_token` (from
    /// `SDLCAI_TOKEN`) takes precedence when set.
    pub fn load(state_dir: &Path, env_token: Option<&str>, api_key: Option<String>) -> Result<Self> {
        let token = match env_token {
            Some(t) => clean_token(t),
            None => crate::io::read_optional(&paths::token_path(state_dir))?
                .as_deref()
                .and_then(clean_token),
        };
        Ok(Self { token, api_key })
    }
}

/// Strip whitespace and one pair of surrounding double quotes, which appear
/// when the token was stored JSON-encoded.
pub fn clean_token(raw: &str) -> Option<String> {
    let t = raw.trim();
    let t = t
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(t)
        .trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
