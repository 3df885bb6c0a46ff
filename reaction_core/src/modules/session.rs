use std::sync::RwLock;

use zeroize::Zeroizing;

/// Supplies the bearer token for authenticated reaction calls.
pub trait SessionProvider: Send + Sync {
    fn token(&self) -> Option<Zeroizing<String>>;
}

/// Session holding a token handed over by the bootstrap collaborator.
#[derive(Default)]
pub struct StaticSession {
    token: RwLock<Option<Zeroizing<String>>>,
}

impl StaticSession {
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set_token(&self, token: String) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(Zeroizing::new(token));
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl SessionProvider for StaticSession {
    fn token(&self) -> Option<Zeroizing<String>> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
