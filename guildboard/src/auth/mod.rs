//! Single-use token managers for the OAuth login flow
//!
//! Two managers with the same shape: [`CsrfStateManager`] protects the
//! redirect leg against cross-site request forgery, and
//! [`SessionExchangeManager`] hands freshly minted local credentials to the
//! browser without ever placing them in a URL. Both delegate all mutual
//! exclusion to the [`crate::store::EphemeralStore`] atomic claim.

pub mod exchange;
pub mod state;
pub mod token;

pub use exchange::{SessionExchangeManager, SessionTokens};
pub use state::CsrfStateManager;
