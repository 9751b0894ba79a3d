//! Resolve which users and teams own a path according to a CODEOWNERS
//! manifest.
//!
//! ```no_run
//! use codeowners_index::OwnershipIndex;
//!
//! let index = OwnershipIndex::build(".", "CODEOWNERS")?;
//! for owner in index.owners("src/main.rs") {
//!     println!("{}", owner);
//! }
//! # Ok::<(), codeowners_index::Error>(())
//! ```
pub mod error;
mod index;
pub mod locator;
pub mod parser;
pub mod pattern;
mod ruleset;

pub use error::{Error, Result};
pub use index::OwnershipIndex;
pub use locator::{locate, Manifest};
pub use pattern::{Pattern, PatternError};
pub use ruleset::{Owner, OwnerKind, Rule, RuleSet};
