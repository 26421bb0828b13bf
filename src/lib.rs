//! # Accounts
//!
//! `accounts` is a small account registration and authentication service.
//! Users register with a name, email, phone number and password, log in with
//! email and password, and can be listed through a read-only directory.
//!
//! ## Credentials
//!
//! Passwords are hashed with **Argon2id** and stored as PHC strings; they never
//! leave the request that carried them and are never logged. Login failures for an
//! unknown email and for a wrong password produce the same response and cost the
//! same amount of hashing work.
//!
//! ## Uniqueness
//!
//! Email (case-insensitive) and phone are unique. The credential store enforces
//! this atomically, so concurrent registrations with the same identity admit
//! exactly one. When both are taken, the email conflict is reported.
//!
//! ## Storage
//!
//! Users live in PostgreSQL (`postgres://` DSN) or, for development and tests, in
//! process memory (`memory://` DSN). Every store call is bounded by a timeout.

pub mod accounts;
pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_hash_is_hex_or_unknown() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
