//! Patient ledger: the pure collection and the session that owns it.

mod collection;
mod session;

pub use collection::PatientCollection;
pub use session::BillingSession;
