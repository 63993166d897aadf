use std::sync::RwLock;

/// Where the bearer token lives between calls (browser storage in a UI).
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: String);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self { Self::default() }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: String) {
        if let Ok(mut t) = self.token.write() {
            *t = Some(token);
        }
    }

    fn clear(&self) {
        if let Ok(mut t) = self.token.write() {
            *t = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);
        store.set("abc".into());
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.clear();
        assert_eq!(store.get(), None);
    }
}
