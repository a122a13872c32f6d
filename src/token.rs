//! Token primitives: redacted secrets, the persisted pair, and unverified inspection.

pub mod inspector;
pub mod pair;
pub mod secret;

pub use inspector::{Claims, InspectError, REFRESH_SKEW_SECS};
pub use pair::TokenPair;
pub use secret::TokenSecret;
