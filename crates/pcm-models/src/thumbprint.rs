//! Certificate thumbprinting: base64url (no padding) SHA-256 of the DER
//! encoding, used for holder-of-key confirmation (`cnf."x5t#S256"`) and for
//! the PEP's advisory mTLS-consistency check.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Computes the base64url SHA-256 thumbprint of a DER-encoded certificate.
pub fn thumbprint_der(der: &[u8]) -> String {
    let digest = Sha256::digest(der);
    URL_SAFE_NO_PAD.encode(digest)
}

/// Parses the first certificate out of a PEM bundle and thumbprints it.
///
/// Returns `None` if the PEM contains no certificate.
pub fn thumbprint_pem(pem: &[u8]) -> Option<String> {
    let mut reader = std::io::BufReader::new(pem);
    let der = rustls_pemfile::certs(&mut reader).next()?.ok()?;
    Some(thumbprint_der(der.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbprint_is_stable_for_same_der() {
        let der = b"not-a-real-cert-but-deterministic";
        assert_eq!(thumbprint_der(der), thumbprint_der(der));
    }

    #[test]
    fn thumbprint_differs_for_different_der() {
        assert_ne!(thumbprint_der(b"a"), thumbprint_der(b"b"));
    }
}
