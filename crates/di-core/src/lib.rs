pub mod context;
pub mod error;
pub mod fingerprint;
pub mod review;
pub mod types;

pub use error::{Error, ExtractError, GatewayError, Result, StoreError};
pub use fingerprint::Fingerprint;
pub use types::*;
