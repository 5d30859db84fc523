//! Domain models for dental billing.

mod app_data;
mod clinic;
mod ids;
mod patient;
mod procedure;

pub use app_data::*;
pub use clinic::*;
pub use ids::*;
pub use patient::*;
pub use procedure::*;
