use sha2::{Digest, Sha256};

/// Hex prefix length of a grant fingerprint. Fixed — changing it orphans
/// every fingerprint already in storage.
const FINGERPRINT_LEN: usize = 12;

/// Derive the stable identity of a grant from its name and provider.
///
/// Both inputs are lower-cased and whitespace-trimmed before hashing, so
/// "Seed Grant " and "seed grant" from different sources collide to the
/// same fingerprint. This is the sole cross-run identity key: lookups and
/// writes in the grants table both go through it.
pub fn fingerprint(name: &str, provider: &str) -> String {
    let canonical = format!(
        "{}-{}",
        name.trim().to_lowercase(),
        provider.trim().to_lowercase()
    );
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..FINGERPRINT_LEN].to_string()
}
