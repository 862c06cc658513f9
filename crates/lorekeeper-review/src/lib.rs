//! Lorekeeper Review Layer
//!
//! Tracks reviewer decisions over extraction candidates and performs the
//! final, partially-tolerant persistence step.
//!
//! # Architecture
//!
//! ```text
//! ExtractPreview -> ReviewQueue (approve/reject/edit/merge) -> Committer -> EntityStore
//!                                                                      \-> SearchIndex
//! ```
//!
//! # Key Behaviors
//!
//! - **State machine**: `Pending -> {Approved, Rejected}`, approve/reject
//!   toggle, edits force `Edited` (committed like approved), merge targets
//!   force `Approved`
//! - **Partial-success commit**: per-item error isolation; a failed entity or
//!   relationship is logged and skipped, never aborting the batch
//! - **Endpoint rule**: a relationship is written only when both its staged
//!   endpoints committed in the same batch
//! - **Index sync**: fire-and-forget per created entity under one aggregate
//!   deadline; stragglers are detached and reported as pending

#![warn(missing_docs)]

mod commit;
mod error;
mod staging;

pub use commit::{
    CommitOptions, CommitReport, CommitRequest, CommittedEntity, Committer, IndexSyncStatus,
};
pub use error::ReviewError;
pub use staging::{EntityEdit, ReviewQueue, ReviewStatus, StagedEntity, StagedRelationship};
