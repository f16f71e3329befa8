//! Current/saved tool-result bookkeeping and the reconciliation policy that
//! decides where a newly fetched result lands.

mod reconcile;
mod store;
mod tracker;

pub use self::reconcile::{Reconciled, reconcile};
pub use self::store::ResultStore;
pub use self::tracker::SubmissionTracker;
