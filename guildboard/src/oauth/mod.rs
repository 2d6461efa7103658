//! OAuth authorization-code flow against the third-party platform
//!
//! The provider client is a thin collaborator ([`provider`]); the
//! coordinator ([`coordinator`]) wires it to the single-use token managers
//! in [`crate::auth`].

pub mod coordinator;
pub mod provider;

pub use coordinator::{
    MintedSession, OAuthFlowCoordinator, OpaqueSessionMinter, Principal, PrincipalResolver,
    ProviderIdentityResolver, SessionMinter,
};
pub use provider::{HttpProviderClient, ProviderClient, ProviderIdentity, ProviderTokens};
