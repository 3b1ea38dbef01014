//! Credential handling for the oracle
//!
//! - `provider`: where the API key comes from (environment, OS keyring,
//!   interactive prompt)
//! - `gate`: the access precondition every oracle call must pass

pub mod gate;
pub mod provider;

pub use gate::{CredentialGate, GateState};
pub use provider::{CredentialProvider, KeyPrompter, KeyringCredentialProvider};
