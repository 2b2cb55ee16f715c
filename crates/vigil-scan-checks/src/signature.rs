//! Detached signature verification.
//!
//! A target `plugin.py` is signed by `plugin.py.sig` (raw signature bytes)
//! and verified against `plugin.py.pem` (PEM or raw key bytes). The check is
//! not applicable when either sidecar is absent.
//!
//! Supported algorithms: `rsa` (PKCS#1 v1.5 over SHA-256), `ecdsa` (P-256
//! over SHA-256, DER or fixed-size signature) and `ed25519`.

use crate::{Check, CheckContext, CheckFailure, CheckValue, Outcome, ScanTarget, MAX_LOADED_FILE_BYTES};
use ed25519_dalek::pkcs8::DecodePublicKey as _;
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};
use p256::ecdsa::signature::Verifier as _;
use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1::DecodeRsaPublicKey as _;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Sidecars are small; anything larger is not a key or signature.
const MAX_SIDECAR_BYTES: u64 = 64 * 1024;

/// Verification errors other than a plain mismatch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("signature algorithm not supported: {0}")]
    Unsupported(String),
    #[error("malformed public key: {0}")]
    MalformedKey(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

impl From<VerifyError> for CheckFailure {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Unsupported(_) => CheckFailure::unsupported(err.to_string()),
            _ => CheckFailure::invalid(err.to_string()),
        }
    }
}

/// Verifies a detached signature over a message.
pub trait SignatureVerifier: Send + Sync {
    /// `Ok(false)` means the signature is well-formed but does not match.
    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<bool, VerifyError>;
}

fn expect_algorithm(algorithm: &str, expected: &str) -> Result<(), VerifyError> {
    if algorithm.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(VerifyError::Unsupported(algorithm.to_string()))
    }
}

/// The key as PEM text, if it looks like PEM.
fn pem_text(public_key: &[u8]) -> Option<&str> {
    std::str::from_utf8(public_key)
        .ok()
        .map(str::trim)
        .filter(|t| t.starts_with("-----BEGIN"))
}

fn malformed_key(e: impl std::fmt::Display) -> VerifyError {
    VerifyError::MalformedKey(e.to_string())
}

/// Ed25519 verification backed by `ed25519-dalek`.
#[derive(Debug, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn parse_key(public_key: &[u8]) -> Result<VerifyingKey, VerifyError> {
        if let Some(pem) = pem_text(public_key) {
            return VerifyingKey::from_public_key_pem(pem).map_err(malformed_key);
        }
        let bytes: [u8; PUBLIC_KEY_LENGTH] = public_key.try_into().map_err(|_| {
            VerifyError::MalformedKey(format!(
                "expected PEM or {PUBLIC_KEY_LENGTH} raw bytes, got {} bytes",
                public_key.len()
            ))
        })?;
        VerifyingKey::from_bytes(&bytes).map_err(malformed_key)
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<bool, VerifyError> {
        expect_algorithm(algorithm, "ed25519")?;
        let key = Self::parse_key(public_key)?;
        let signature = Signature::from_slice(signature)
            .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;
        Ok(key.verify_strict(message, &signature).is_ok())
    }
}

/// RSA PKCS#1 v1.5 over SHA-256, backed by `rsa`.
///
/// Accepts SPKI (`PUBLIC KEY`) or PKCS#1 (`RSA PUBLIC KEY`) PEM, or SPKI DER.
#[derive(Debug, Default)]
pub struct RsaVerifier;

impl RsaVerifier {
    fn parse_key(public_key: &[u8]) -> Result<RsaPublicKey, VerifyError> {
        match pem_text(public_key) {
            Some(pem) if pem.starts_with("-----BEGIN RSA PUBLIC KEY") => {
                RsaPublicKey::from_pkcs1_pem(pem).map_err(malformed_key)
            }
            Some(pem) => RsaPublicKey::from_public_key_pem(pem).map_err(malformed_key),
            None => RsaPublicKey::from_public_key_der(public_key).map_err(malformed_key),
        }
    }
}

impl SignatureVerifier for RsaVerifier {
    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<bool, VerifyError> {
        expect_algorithm(algorithm, "rsa")?;
        let key = Self::parse_key(public_key)?;
        let hashed = Sha256::digest(message);
        Ok(key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
            .is_ok())
    }
}

/// ECDSA on P-256 over SHA-256, backed by `p256`.
///
/// Keys are SPKI PEM or SEC1 point bytes; signatures are DER or the
/// 64-byte `r || s` form.
#[derive(Debug, Default)]
pub struct EcdsaP256Verifier;

impl EcdsaP256Verifier {
    fn parse_key(public_key: &[u8]) -> Result<p256::ecdsa::VerifyingKey, VerifyError> {
        match pem_text(public_key) {
            Some(pem) => p256::ecdsa::VerifyingKey::from_public_key_pem(pem).map_err(malformed_key),
            None => p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(malformed_key),
        }
    }

    fn parse_signature(signature: &[u8]) -> Result<p256::ecdsa::Signature, VerifyError> {
        p256::ecdsa::Signature::from_der(signature)
            .or_else(|_| p256::ecdsa::Signature::from_slice(signature))
            .map_err(|e| VerifyError::MalformedSignature(e.to_string()))
    }
}

impl SignatureVerifier for EcdsaP256Verifier {
    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<bool, VerifyError> {
        expect_algorithm(algorithm, "ecdsa")?;
        let key = Self::parse_key(public_key)?;
        let signature = Self::parse_signature(signature)?;
        Ok(key.verify(message, &signature).is_ok())
    }
}

/// Picks the verifier for the configured algorithm name.
#[derive(Debug, Default)]
pub struct StandardVerifier;

impl SignatureVerifier for StandardVerifier {
    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<bool, VerifyError> {
        let verifier: &dyn SignatureVerifier = match algorithm.to_ascii_lowercase().as_str() {
            "rsa" => &RsaVerifier,
            "ecdsa" => &EcdsaP256Verifier,
            "ed25519" => &Ed25519Verifier,
            _ => return Err(VerifyError::Unsupported(algorithm.to_string())),
        };
        verifier.verify(algorithm, message, signature, public_key)
    }
}

/// Verify the target against its sidecar signature and key.
pub struct SignatureCheck {
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignatureCheck {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }
}

impl Default for SignatureCheck {
    fn default() -> Self {
        Self::new(Arc::new(StandardVerifier))
    }
}

impl std::fmt::Debug for SignatureCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCheck").finish_non_exhaustive()
    }
}

impl Check for SignatureCheck {
    fn name(&self) -> &str {
        "signature"
    }

    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome {
        let config = &ctx.config;
        let sig_path = target.sidecar(&config.signature_suffix);
        let key_path = target.sidecar(&config.public_key_suffix);
        if !sig_path.is_file() || !key_path.is_file() {
            return Ok(CheckValue::NotApplicable {
                reason: format!(
                    "no {} and {} alongside target",
                    config.signature_suffix, config.public_key_suffix
                ),
            });
        }

        let signature = vigil_common_core::fs::read_bytes(&sig_path, MAX_SIDECAR_BYTES)?;
        let public_key = vigil_common_core::fs::read_bytes(&key_path, MAX_SIDECAR_BYTES)?;
        ctx.cancel.checkpoint()?;
        let message = vigil_common_core::fs::read_bytes(target.path(), MAX_LOADED_FILE_BYTES)?;
        ctx.cancel.checkpoint()?;

        let valid = self
            .verifier
            .verify(&config.signature_algorithm, &message, &signature, &public_key)?;
        if !valid {
            tracing::warn!(path = %target.path().display(), "signature mismatch");
        }
        Ok(CheckValue::SignatureValid(valid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckConfig, FailureKind};
    use ed25519_dalek::{Signer, SigningKey};
    use std::path::Path;
    use vigil_test_utils::{temp_dir, write_file};

    const MESSAGE: &str = "print('hello')";

    const SPKI_ED25519_PREFIX: [u8; 12] = [
        0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
    ];

    // Produced with `openssl dgst -sha256 -sign` over MESSAGE.
    const RSA_SPKI_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAq7yNU6DDrCOlfYZZV21m
wab1wqDuyS9mXnYil08xd/DTqma/W5Vq4r+V8Mq5gC+ivI5fRCeujDUDSFB1zut/
jH+4rogIYlSDEgi03q8WiB1L9AhtTGvwHuRwEU/5PqO+hRuwtzu6oQ0yJe1qTxmW
IO3CObyNLx0xrI3IKge5YqZiLKHM6Kq3o5KSqFxlNegebOVshCg9QKbW6nn3caX/
gNqZZXmKkjxHRAehqwb4wvXPpSQr/4bRm/P75jKZa2XJMOOBsuObdHlm9PdgDFKD
eu8YaQDieHWPcSjXorcGP4EVGWY/4qw7JtZCzau8gafNWzm2+Z7YhbabYDQ5hqcU
uQIDAQAB
-----END PUBLIC KEY-----
";

    const RSA_PKCS1_PEM: &str = "-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEAq7yNU6DDrCOlfYZZV21mwab1wqDuyS9mXnYil08xd/DTqma/W5Vq
4r+V8Mq5gC+ivI5fRCeujDUDSFB1zut/jH+4rogIYlSDEgi03q8WiB1L9AhtTGvw
HuRwEU/5PqO+hRuwtzu6oQ0yJe1qTxmWIO3CObyNLx0xrI3IKge5YqZiLKHM6Kq3
o5KSqFxlNegebOVshCg9QKbW6nn3caX/gNqZZXmKkjxHRAehqwb4wvXPpSQr/4bR
m/P75jKZa2XJMOOBsuObdHlm9PdgDFKDeu8YaQDieHWPcSjXorcGP4EVGWY/4qw7
JtZCzau8gafNWzm2+Z7YhbabYDQ5hqcUuQIDAQAB
-----END RSA PUBLIC KEY-----
";

    const RSA_SIGNATURE_HEX: &str = "4f9a61130efc7cb39ce1490a78876a0e5c555961a8de0a9555a6d2c4d5a263bb\
        1204a79479c5b5bd2662bf0891a3b038c2718c84888be0c3c4667ef28cb0c2d9\
        e3f8bc67c8efc58bd7b688a2a1f9e872fc4ad76d577a85af7d6ce9e0698f9097\
        854f310f453621dd6b9af501212d81c5e1a614412921bc9ba39f593b43aa851c\
        5d9066b9f22db215f6813789f2a7dad1192146fb7f3c570be1eea338f80f37d2\
        1c9bbd5a4e7926c698b211a2a45bde1c7847a4eec6393edf297dcc96731310ad\
        d00b0e87925a7355d8e6357d37407bff55b5806980d34c0772b8f8092ff68607\
        73580d053f04ec84d470b43ebbd6ec35d294b9c5564b4919bd98e0c9dc4a14c5";

    const ECDSA_SPKI_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEV991afH0InV2T62HFD2OzRkcZici
lligvjIz12NAyAvZnfvEvHmlyi7R+7BBAJ7dQF/QHbJnMyJEZf1dUXJf9g==
-----END PUBLIC KEY-----
";

    const ECDSA_R_HEX: &str = "79ca330f52d4203073796cbcbcd645ee34b46b9c83d9322ad6df129eeb8bbb3a";
    const ECDSA_S_HEX: &str = "44405f0fd9be444ab8c78c33d805d8f510f28f89b675400f8ddbb0033635769f";

    fn hex(text: &str) -> Vec<u8> {
        (0..text.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&text[i..i + 2], 16).unwrap())
            .collect()
    }

    fn ecdsa_der_signature() -> Vec<u8> {
        let mut der = vec![0x30, 0x44, 0x02, 0x20];
        der.extend(hex(ECDSA_R_HEX));
        der.extend([0x02, 0x20]);
        der.extend(hex(ECDSA_S_HEX));
        der
    }

    fn base64(data: &[u8]) -> String {
        const ALPHABET: &[u8; 64] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
        let mut out = String::new();
        for chunk in data.chunks(3) {
            let b = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
            let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
            for i in 0..4 {
                if i <= chunk.len() {
                    out.push(ALPHABET[((n >> (18 - 6 * i)) & 63) as usize] as char);
                } else {
                    out.push('=');
                }
            }
        }
        out
    }

    fn pem_for(key: &VerifyingKey) -> String {
        let mut der = SPKI_ED25519_PREFIX.to_vec();
        der.extend_from_slice(key.as_bytes());
        format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n",
            base64(&der)
        )
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn write_target(dir: &Path, content: &str, signature: Vec<u8>, key: Vec<u8>) -> ScanTarget {
        let path = write_file(dir, "plugin.py", content);
        write_file(dir, "plugin.py.sig", signature);
        write_file(dir, "plugin.py.pem", key);
        ScanTarget::new(path)
    }

    fn signed_target(dir: &Path, content: &str, key_bytes: Vec<u8>) -> ScanTarget {
        let sig = signing_key().sign(MESSAGE.as_bytes());
        write_target(dir, content, sig.to_bytes().to_vec(), key_bytes)
    }

    fn ctx_for(algorithm: &str) -> CheckContext {
        let mut config = CheckConfig::new("rules.yar", "cve.json");
        config.signature_algorithm = algorithm.into();
        CheckContext::new(Arc::new(config))
    }

    fn ctx() -> CheckContext {
        ctx_for("ed25519")
    }

    #[test]
    fn test_valid_signature_with_raw_key() {
        let dir = temp_dir();
        let raw = signing_key().verifying_key().to_bytes().to_vec();
        let target = signed_target(dir.path(), MESSAGE, raw);
        assert_eq!(
            SignatureCheck::default().run(&target, &ctx()).unwrap(),
            CheckValue::SignatureValid(true)
        );
    }

    #[test]
    fn test_valid_signature_with_pem_key() {
        let dir = temp_dir();
        let pem = pem_for(&signing_key().verifying_key()).into_bytes();
        let target = signed_target(dir.path(), MESSAGE, pem);
        assert_eq!(
            SignatureCheck::default().run(&target, &ctx()).unwrap(),
            CheckValue::SignatureValid(true)
        );
    }

    #[test]
    fn test_modified_content_fails_verification() {
        let dir = temp_dir();
        let raw = signing_key().verifying_key().to_bytes().to_vec();
        let target = signed_target(dir.path(), "print('tampered')", raw);
        assert_eq!(
            SignatureCheck::default().run(&target, &ctx()).unwrap(),
            CheckValue::SignatureValid(false)
        );
    }

    #[test]
    fn test_rsa_signature_from_openssl() {
        for key in [RSA_SPKI_PEM, RSA_PKCS1_PEM] {
            let dir = temp_dir();
            let target = write_target(dir.path(), MESSAGE, hex(RSA_SIGNATURE_HEX), key.into());
            assert_eq!(
                SignatureCheck::default().run(&target, &ctx_for("rsa")).unwrap(),
                CheckValue::SignatureValid(true)
            );

            let target = write_target(dir.path(), "print('tampered')", hex(RSA_SIGNATURE_HEX), key.into());
            assert_eq!(
                SignatureCheck::default().run(&target, &ctx_for("RSA")).unwrap(),
                CheckValue::SignatureValid(false)
            );
        }
    }

    #[test]
    fn test_rsa_rejects_foreign_key() {
        let dir = temp_dir();
        let target = write_target(dir.path(), MESSAGE, hex(RSA_SIGNATURE_HEX), ECDSA_SPKI_PEM.into());
        let failure = SignatureCheck::default().run(&target, &ctx_for("rsa")).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_ecdsa_signature_der_and_fixed_size() {
        let mut fixed = hex(ECDSA_R_HEX);
        fixed.extend(hex(ECDSA_S_HEX));

        for signature in [ecdsa_der_signature(), fixed] {
            let dir = temp_dir();
            let target = write_target(dir.path(), MESSAGE, signature.clone(), ECDSA_SPKI_PEM.into());
            assert_eq!(
                SignatureCheck::default().run(&target, &ctx_for("ecdsa")).unwrap(),
                CheckValue::SignatureValid(true)
            );

            let target = write_target(dir.path(), "print('tampered')", signature, ECDSA_SPKI_PEM.into());
            assert_eq!(
                SignatureCheck::default().run(&target, &ctx_for("ecdsa")).unwrap(),
                CheckValue::SignatureValid(false)
            );
        }
    }

    #[test]
    fn test_ecdsa_malformed_signature() {
        let dir = temp_dir();
        let target = write_target(dir.path(), MESSAGE, b"short".to_vec(), ECDSA_SPKI_PEM.into());
        let failure = SignatureCheck::default().run(&target, &ctx_for("ecdsa")).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_not_applicable_without_sidecars() {
        let dir = temp_dir();
        let target = ScanTarget::new(write_file(dir.path(), "plugin.py", "x"));
        write_file(dir.path(), "plugin.py.sig", [0u8; 64]);
        let outcome = SignatureCheck::default().run(&target, &ctx()).unwrap();
        assert!(matches!(outcome, CheckValue::NotApplicable { .. }));
    }

    #[test]
    fn test_malformed_inputs() {
        let dir = temp_dir();
        let target = signed_target(dir.path(), MESSAGE, b"not a key".to_vec());
        let failure = SignatureCheck::default().run(&target, &ctx()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidInput);

        write_file(dir.path(), "plugin.py.pem", signing_key().verifying_key().to_bytes());
        write_file(dir.path(), "plugin.py.sig", b"short");
        let failure = SignatureCheck::default().run(&target, &ctx()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let dir = temp_dir();
        let raw = signing_key().verifying_key().to_bytes().to_vec();
        let target = signed_target(dir.path(), MESSAGE, raw);
        let failure = SignatureCheck::default().run(&target, &ctx_for("dsa")).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unsupported);
    }

    #[test]
    fn test_single_algorithm_verifier_rejects_others() {
        assert_eq!(
            Ed25519Verifier.verify("rsa", b"m", &[0; 64], &[0; 32]),
            Err(VerifyError::Unsupported("rsa".into()))
        );
    }
}
