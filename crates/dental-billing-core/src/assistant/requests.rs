//! In-flight bookkeeping for assistant requests.
//!
//! A request is opened with a ticket and closed by handing the ticket back
//! with the assistant's result. At most one request per initiating action is
//! open at a time. Tickets remember the session state they were issued
//! against so a late response can be recognised as stale.

use std::collections::HashMap;
use std::fmt;

use crate::error::{BillingError, BillingResult};
use crate::models::{PatientId, ProcedureId};

/// The user action a request was started from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    /// "Suggest" on the procedure form
    Suggestion,
    /// "Generate image" on one procedure row
    Image {
        patient_id: PatientId,
        procedure_id: ProcedureId,
    },
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKey::Suggestion => f.write_str("procedure suggestion"),
            RequestKey::Image { procedure_id, .. } => {
                write!(f, "image for procedure {procedure_id}")
            }
        }
    }
}

/// Handle for an outstanding suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub(crate) serial: u64,
    pub(crate) epoch: u64,
    /// Patient whose form asked for the suggestion
    pub patient_id: PatientId,
    /// Free-text description sent to the assistant
    pub prompt: String,
}

/// Handle for an outstanding image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTicket {
    pub(crate) serial: u64,
    pub(crate) epoch: u64,
    pub patient_id: PatientId,
    pub procedure_id: ProcedureId,
    /// Procedure name sent to the assistant
    pub procedure_name: String,
}

impl ImageTicket {
    pub(crate) fn key(&self) -> RequestKey {
        RequestKey::Image {
            patient_id: self.patient_id.clone(),
            procedure_id: self.procedure_id.clone(),
        }
    }
}

/// Why a response was dropped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The user moved to a different patient after asking
    SelectionChanged,
    /// An import replaced the data the request was made against
    DataReplaced,
    /// The ticket no longer matches the open request for its action
    Superseded,
}

/// Outcome of completing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded(DiscardReason),
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied)
    }
}

/// Open requests keyed by the action that started them.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_serial: u64,
    open: HashMap<RequestKey, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a request for `key`, rejecting a second one while the first is
    /// still outstanding.
    pub fn begin(&mut self, key: RequestKey) -> BillingResult<u64> {
        if self.open.contains_key(&key) {
            return Err(BillingError::RequestInFlight(key.to_string()));
        }
        self.next_serial += 1;
        let serial = self.next_serial;
        self.open.insert(key, serial);
        Ok(serial)
    }

    /// Close the request for `key` if `serial` is the one currently open.
    ///
    /// Returns false when the serial does not match, leaving any newer
    /// request untouched.
    pub fn finish(&mut self, key: &RequestKey, serial: u64) -> bool {
        match self.open.get(key) {
            Some(open) if *open == serial => {
                self.open.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Drop the open request for `key` without a result. A ticket completed
    /// afterwards no longer matches and is discarded.
    pub fn abandon(&mut self, key: &RequestKey) -> bool {
        self.open.remove(key).is_some()
    }

    /// Drop every open request. Serials keep counting, so tickets issued
    /// before the clear never match a later request.
    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn is_open(&self, key: &RequestKey) -> bool {
        self.open.contains_key(key)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
