//! The materialized fact index.
//!
//! An [`Index`] folds a fact multiset into three queryable projections:
//!
//! - **EAV** — entity → attribute → live values, in assertion order
//! - **AVE** — attribute → value → entities, backing unique checks and
//!   value lookups
//! - **VAE** — referenced entity → attribute → referring entities, for
//!   reverse reference walking (keyed by `Ref` values only)
//!
//! Indexes have value semantics: [`Index::add_facts`] returns a new index
//! and leaves the receiver untouched, so a failed fold (schema violation,
//! uniqueness conflict) cannot corrupt the current view.

pub mod error;
pub mod index;

pub use error::{IndexError, IndexResult};
pub use index::Index;
