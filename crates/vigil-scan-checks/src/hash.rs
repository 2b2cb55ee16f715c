//! Streaming file digests.

use crate::{Check, CheckContext, CheckFailure, CheckValue, Outcome, ScanTarget};
use sha2::digest::DynDigest;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use vigil_common_core::digest::to_hex;

const CHUNK_SIZE: usize = 64 * 1024;

/// Lowercase, with `-` folded to `_` (`SHA3-256` becomes `sha3_256`).
fn normalize(name: &str) -> String {
    name.to_ascii_lowercase().replace('-', "_")
}

fn hasher_for(name: &str) -> Option<Box<dyn DynDigest>> {
    let hasher: Box<dyn DynDigest> = match name {
        "md5" => Box::new(md5::Md5::default()),
        "sha1" => Box::new(sha1::Sha1::default()),
        "sha224" => Box::new(sha2::Sha224::default()),
        "sha256" => Box::new(sha2::Sha256::default()),
        "sha384" => Box::new(sha2::Sha384::default()),
        "sha512" => Box::new(sha2::Sha512::default()),
        "sha3_224" => Box::new(sha3::Sha3_224::default()),
        "sha3_256" => Box::new(sha3::Sha3_256::default()),
        "sha3_384" => Box::new(sha3::Sha3_384::default()),
        "sha3_512" => Box::new(sha3::Sha3_512::default()),
        _ => return None,
    };
    Some(hasher)
}

/// Digest the file in fixed-size chunks with every configured algorithm.
#[derive(Debug, Default)]
pub struct HashCheck;

impl HashCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for HashCheck {
    fn name(&self) -> &str {
        "hash"
    }

    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome {
        let algorithms = &ctx.config.hash_algorithms;
        if algorithms.is_empty() {
            return Err(CheckFailure::invalid("no hash algorithms configured"));
        }
        let mut hashers = Vec::with_capacity(algorithms.len());
        for name in algorithms {
            let normalized = normalize(name);
            let hasher = hasher_for(&normalized)
                .ok_or_else(|| CheckFailure::unsupported(format!("hash algorithm {name}")))?;
            hashers.push((normalized, hasher));
        }

        let path = target.path();
        let mut file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CheckFailure::missing(format!("file not found: {}", path.display())),
            _ => CheckFailure::io(format!("{}: {e}", path.display())),
        })?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            ctx.cancel.checkpoint()?;
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CheckFailure::io(format!("{}: {e}", path.display()))),
            };
            for (_, hasher) in hashers.iter_mut() {
                hasher.update(&buf[..n]);
            }
        }

        let digests: BTreeMap<String, String> = hashers
            .into_iter()
            .map(|(name, hasher)| (name, to_hex(&hasher.finalize())))
            .collect();
        Ok(CheckValue::Digests(digests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckConfig, FailureKind};
    use std::sync::Arc;
    use vigil_test_utils::{temp_dir, write_file};

    fn ctx(algorithms: &[&str]) -> CheckContext {
        let mut config = CheckConfig::new("rules.yar", "cve.json");
        config.hash_algorithms = algorithms.iter().map(|s| s.to_string()).collect();
        CheckContext::new(Arc::new(config))
    }

    fn digests(outcome: Outcome) -> BTreeMap<String, String> {
        match outcome.unwrap() {
            CheckValue::Digests(d) => d,
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_known_digests() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "abc.txt", "abc");
        let d = digests(HashCheck.run(&ScanTarget::new(path), &ctx(&["sha256", "sha512"])));
        assert_eq!(
            d["sha256"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(d["sha512"].len(), 128);
    }

    #[test]
    fn test_empty_file_sha256() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "empty", "");
        let d = digests(HashCheck.run(&ScanTarget::new(path), &ctx(&["sha256"])));
        assert_eq!(
            d["sha256"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_multi_chunk_file_matches_one_shot() {
        let dir = temp_dir();
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let path = write_file(dir.path(), "big.bin", &data);
        let d = digests(HashCheck.run(&ScanTarget::new(path), &ctx(&["SHA256"])));
        assert_eq!(d["sha256"], to_hex(&<sha2::Sha256 as sha2::Digest>::digest(&data)));
    }

    #[test]
    fn test_legacy_and_sha3_digests() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "abc.txt", "abc");
        let d = digests(HashCheck.run(
            &ScanTarget::new(path),
            &ctx(&["md5", "sha1", "SHA3-256", "sha3_512"]),
        ));
        assert_eq!(d["md5"], "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(d["sha1"], "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            d["sha3_256"],
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
        assert_eq!(d["sha3_512"].len(), 128);
    }

    #[test]
    fn test_missing_file() {
        let failure = HashCheck
            .run(&ScanTarget::new("/nonexistent/vigil.py"), &ctx(&["sha256"]))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::MissingInput);
    }

    #[test]
    fn test_unknown_algorithm() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "a", "x");
        let failure = HashCheck.run(&ScanTarget::new(path), &ctx(&["whirlpool"])).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unsupported);
    }

    #[test]
    fn test_cancelled_before_read() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "a", "x");
        let ctx = ctx(&["sha256"]);
        ctx.cancel.cancel();
        let failure = HashCheck.run(&ScanTarget::new(path), &ctx).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Cancelled);
    }
}
