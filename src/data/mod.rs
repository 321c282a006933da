//! Feed ingestion
//!
//! Provider feed parsing, file discovery and pairing, identity resolution
//! and the per-dataset session.

pub mod aggregate;
pub mod identity;
pub mod providers;
pub mod session;

pub use aggregate::{Discovery, LoadWarning};
pub use identity::IdentityResolver;
pub use providers::RawFeed;
pub use session::{LoadedMatch, Session};
