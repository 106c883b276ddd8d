mod credentials;
mod gate;

pub use crate::error::AuthError;
pub use credentials::{Credentials, CredentialValidator, LoginOutcome, StaticCredentialValidator};
pub use gate::{SessionGate, DEFAULT_LOGIN_DELAY};
