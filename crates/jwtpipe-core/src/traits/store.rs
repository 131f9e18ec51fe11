//! Credential store trait.

use crate::tokens::{AccessToken, RefreshToken, TokenKind, TokenPair};

/// Holds the access and refresh credentials of one session.
///
/// Every operation is atomic with respect to every other: `set_pair` makes
/// both credentials visible together and `clear` removes both as a single
/// transition. Reads never wait on I/O. Durable stores may write through
/// synchronously on mutation, outside the lock readers take; they never
/// fail and log persistence errors instead.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential of the requested kind.
    fn get(&self, kind: TokenKind) -> Option<String>;

    /// Overwrite one credential.
    fn set(&self, kind: TokenKind, value: String);

    /// Store an access/refresh pair as one update.
    fn set_pair(&self, pair: TokenPair);

    /// Remove both credentials.
    fn clear(&self);

    /// Store a renewed access token, and the rotated refresh token if there
    /// is one, but only while `issued_with` is still the stored refresh token.
    ///
    /// Returns false and leaves the store untouched otherwise.
    fn renew_access(
        &self,
        issued_with: &RefreshToken,
        access: &AccessToken,
        rotated: Option<&RefreshToken>,
    ) -> bool;

    /// Remove both credentials, but only while the stored refresh token is
    /// still `expected` (`None` meaning no refresh token is stored).
    ///
    /// Returns false and leaves the store untouched otherwise.
    fn clear_if(&self, expected: Option<&RefreshToken>) -> bool;

    /// Returns true iff an access credential is present.
    fn is_authenticated(&self) -> bool {
        self.get(TokenKind::Access).is_some()
    }

    fn access_token(&self) -> Option<AccessToken> {
        self.get(TokenKind::Access).map(AccessToken::new)
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.get(TokenKind::Refresh).map(RefreshToken::new)
    }
}
