//! Bearer credential supply for proxied calls.

use std::sync::RwLock;

/// Supplies the bearer token attached to every proxied call.
///
/// Returning `None` means the user is signed out; callers must fail with
/// `Unauthorized` without issuing a request.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Credential held in memory, replaceable at sign-in/sign-out.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }

    pub fn set(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token.filter(|t| !t.is_empty());
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_absent() {
        let creds = StaticCredentials::new(Some(String::new()));
        assert!(creds.bearer_token().is_none());

        creds.set(Some("abc".into()));
        assert_eq!(creds.bearer_token().as_deref(), Some("abc"));

        creds.set(None);
        assert!(creds.bearer_token().is_none());
    }
}
