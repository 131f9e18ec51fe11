//! In-memory credential store.

use std::sync::{PoisonError, RwLock};

use jwtpipe_core::{AccessToken, CredentialStore, RefreshToken, TokenKind, TokenPair};

#[derive(Debug, Default, Clone)]
struct Slots {
    access: Option<String>,
    refresh: Option<String>,
}

impl Slots {
    fn refresh_is(&self, expected: Option<&RefreshToken>) -> bool {
        self.refresh.as_deref() == expected.map(RefreshToken::as_str)
    }

    fn slot(&mut self, kind: TokenKind) -> &mut Option<String> {
        match kind {
            TokenKind::Access => &mut self.access,
            TokenKind::Refresh => &mut self.refresh,
        }
    }
}

/// A [`CredentialStore`] that lives as long as the process.
///
/// Both slots sit behind one lock, so pair updates and clears are observed
/// as single transitions.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<Slots>,
}

impl MemoryStore {
    /// Create an empty (anonymous) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_pair(pair: TokenPair) -> Self {
        let store = Self::new();
        store.set_pair(pair);
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match kind {
            TokenKind::Access => slots.access.clone(),
            TokenKind::Refresh => slots.refresh.clone(),
        }
    }

    fn set(&self, kind: TokenKind, value: String) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots.slot(kind) = Some(value);
    }

    fn set_pair(&self, pair: TokenPair) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.access = Some(pair.access.as_str().to_string());
        slots.refresh = Some(pair.refresh.as_str().to_string());
    }

    fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots = Slots::default();
    }

    fn renew_access(
        &self,
        issued_with: &RefreshToken,
        access: &AccessToken,
        rotated: Option<&RefreshToken>,
    ) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if !slots.refresh_is(Some(issued_with)) {
            return false;
        }
        slots.access = Some(access.as_str().to_string());
        if let Some(rotated) = rotated {
            slots.refresh = Some(rotated.as_str().to_string());
        }
        true
    }

    fn clear_if(&self, expected: Option<&RefreshToken>) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if !slots.refresh_is(expected) {
            return false;
        }
        *slots = Slots::default();
        true
    }
}

// Tokens are never printed
impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
