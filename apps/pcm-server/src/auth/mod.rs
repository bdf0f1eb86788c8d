//! Authentication/authorization primitives for the AS+RS process.
//!
//! `ferrum::auth` validates *inbound* OIDC bearer tokens against a JWKS;
//! this system instead issues its own opaque tokens, so the shape kept
//! from `ferrum` is the `Principal` + `FromRequestParts` extractor pattern
//! (`auth_middleware`/`AuthenticatedPrincipal` there), generalized here to
//! look tokens up in the in-process [`pcm_store::TokenStore`] instead of a
//! remote introspection call.

pub mod assertion;
pub mod principal;

pub use assertion::{verify_client_assertion, AssertionExtensions, B2bExtension, ClientAssertionClaims};
pub use principal::Principal;
