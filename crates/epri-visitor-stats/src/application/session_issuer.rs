//! Anonymous session id issuance.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use epri_core::error::DomainError;
use epri_core::rng::SessionEntropy;

/// Random bytes per session id (256 bits).
pub const SESSION_ID_BYTES: usize = 32;

/// Issues a new opaque session id: [`SESSION_ID_BYTES`] random bytes encoded
/// as unpadded base64url (43 characters). Nothing is persisted and no
/// uniqueness check is made against the store.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the entropy source is
/// unavailable.
pub fn issue_session_id(entropy: &mut dyn SessionEntropy) -> Result<String, DomainError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    entropy.fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
