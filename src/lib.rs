//! # Bookvault
//!
//! `bookvault` is a small multi-tenant book catalogue API. Its interesting part is
//! the credential and authorization core in [`auth`]:
//!
//! - **Passwords** are hashed with Argon2id (salted, PHC string format) and verified
//!   in constant time. Plaintext and hashes never leave the hashing boundary.
//! - **Bearer tokens** are stateless HS256 JWTs carrying `user_id`, `username`,
//!   `iat` and `exp`. They are valid for exactly 24 hours and cannot be revoked.
//! - **Ownership** is the only permission. Every read, update or delete of a book
//!   compares the book's owner with the authenticated identity.
//!
//! ## Error policy
//!
//! A missing book yields `404 Not Found`; a book owned by someone else yields
//! `403 Forbidden`. Wrong usernames and wrong passwords are indistinguishable
//! (`401 Unauthorized`).

pub mod api;
pub mod auth;
pub mod books;
pub mod cli;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
