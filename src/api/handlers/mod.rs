pub mod books;
pub mod health;
pub mod principal;
pub mod root;
pub mod user_login;
pub mod user_register;

pub use self::principal::{extract_bearer_token, require_auth};
