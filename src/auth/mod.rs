//! Credential and authorization core.
//!
//! Flow Overview:
//! - register: validate, hash (`password`), insert (`store`).
//! - login: lookup (`store`), verify (`password`), issue (`token`).
//! - protected request: verify token (`token`), then `guard` before touching an
//!   owned resource.

pub mod error;
pub mod gate;
pub mod guard;
pub mod identity;
pub mod password;
pub mod store;
pub mod token;

pub use error::{AuthError, StoreError};
pub use gate::AuthenticationGate;
pub use guard::{authorize, authorize_resource, Owned};
pub use identity::{Identity, UserId};
pub use password::{HashedPassword, PasswordHasher, PasswordParams};
pub use store::{CredentialRecord, CredentialStore, MemoryCredentialStore};
pub use token::{Claims, TokenIssuer, TokenVerifier, TOKEN_TTL_SECONDS};
