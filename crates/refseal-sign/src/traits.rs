use refseal_types::Principal;

use crate::error::SignError;

/// Produces detached signatures over commit payloads.
///
/// Ambient signer configuration (which key, which scheme) enters only
/// through construction of the implementing type; the ledger core passes an
/// opaque payload and stores the opaque signature it gets back.
pub trait CommitSigner: Send + Sync {
    /// Sign the canonical payload bytes of a commit.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignError>;

    /// The principal this signer signs as.
    fn principal(&self) -> Principal;
}

/// Verifies detached signatures against a principal's declared key.
///
/// Implementations dispatch on [`Principal::key_type`]; a backend that does
/// not handle the declared type returns [`SignError::UnsupportedKeyType`] so
/// callers can distinguish "wrong key" from "wrong backend".
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        principal: &Principal,
        payload: &[u8],
        signature: &[u8],
    ) -> Result<(), SignError>;
}
