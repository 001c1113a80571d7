pub mod catalog;
pub mod errors;
mod escaping;
pub mod message;
mod monitored;
pub mod rules;
pub mod sieve;
pub mod text;
mod traits;
mod twrapper;

pub use crate::catalog::header::Wrapping;
pub use crate::catalog::{Catalog, CatalogError, SyncOptions};
pub use crate::errors::CatalogSyntaxError;
pub use crate::message::{Message, MessageState, SourceRef};
pub use crate::monitored::{MonPair, MonSet, MonVal, MonVec};
pub use crate::rules::{match_message, HookRegistry, MatchFailure, Rule, RuleSet, TriggerPart};
pub use crate::sieve::{Sieve, SieveParams};
pub use crate::traits::Merge;

/// Parses `content` as a complete PO catalog.
///
/// A thin convenience wrapper over [`Catalog::parse`], mirroring the
/// free-function entry point catalogs are usually loaded through.
pub fn pofile(content: &str) -> Result<Catalog, CatalogSyntaxError> {
    Catalog::parse(content)
}
