//! Backup/restore and invoice output.

pub mod backup;
mod invoice;

pub use invoice::*;
