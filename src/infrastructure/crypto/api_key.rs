//! API key hashing and lookup
//!
//! Keys are never stored in clear; configuration carries the SHA-256 hex
//! digest of each key together with the role it grants.

use std::collections::HashMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Actor, ActorRole};

/// API key prefix for identification
const API_KEY_PREFIX: &str = "ftb_";

/// A configured key: display name, digest and granted role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub name: String,
    /// Lower-case SHA-256 hex digest of the key
    pub key_hash: String,
    pub role: ActorRole,
}

/// Generate a new random API key: `ftb_<32 alphanumerics>`.
pub fn generate_api_key() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_PREFIX, random)
}

/// Hash an API key for storage using SHA-256
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify an API key against a stored hash
pub fn verify_api_key(key: &str, stored_hash: &str) -> bool {
    hash_api_key(key).eq_ignore_ascii_case(stored_hash)
}

/// Digest → actor lookup built from configuration.
#[derive(Debug, Default, Clone)]
pub struct ApiKeyRegistry {
    by_hash: HashMap<String, Actor>,
}

impl ApiKeyRegistry {
    pub fn new(entries: &[ApiKeyEntry]) -> Self {
        let by_hash = entries
            .iter()
            .map(|e| {
                let actor = Actor {
                    name: e.name.clone(),
                    role: e.role,
                };
                (e.key_hash.to_ascii_lowercase(), actor)
            })
            .collect();
        Self { by_hash }
    }

    /// Resolve a presented key to the actor it identifies.
    pub fn authenticate(&self, key: &str) -> Option<Actor> {
        self.by_hash.get(&hash_api_key(key.trim())).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_api_key("secret");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_api_key("secret"));
        assert!(verify_api_key("secret", &h.to_uppercase()));
        assert!(!verify_api_key("Secret", &h));
    }

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn registry_resolves_roles() {
        let registry = ApiKeyRegistry::new(&[
            ApiKeyEntry {
                name: "counter".into(),
                key_hash: hash_api_key("staff-key"),
                role: ActorRole::Staff,
            },
            ApiKeyEntry {
                name: "owner".into(),
                key_hash: hash_api_key("admin-key").to_uppercase(),
                role: ActorRole::Admin,
            },
        ]);

        let staff = registry.authenticate("staff-key").unwrap();
        assert_eq!(staff.name, "counter");
        assert!(staff.is_staff() && !staff.is_admin());
        assert!(registry.authenticate("admin-key").unwrap().is_admin());
        assert!(registry.authenticate("nope").is_none());
    }
}
