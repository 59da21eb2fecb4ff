//! Repository abstractions for ledger access.
//!
//! Repositories run the domain logic from `exportflow-core` inside ledger
//! transactions, hiding key layout and serialization from callers.

pub mod cases;
pub mod documents;
pub mod history;
pub mod index;
pub mod queries;
pub mod users;

pub use cases::{CaseRepository, Mutation, Staged};
pub use documents::DocumentRepository;
pub use history::{HistoryIter, HistoryReader};
pub use queries::{CaseQueries, ScanMetrics, SkippedRecordCounter};
pub use users::{NewUser, User, UserRegistry};
