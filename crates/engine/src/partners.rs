//! Partner directory collaborator.
//!
//! Partners (customers, suppliers) are managed outside the engine. The engine
//! only needs to know whether a partner id exists before opening a receivable
//! against it.

use std::{collections::HashSet, fmt::Debug};

pub trait PartnerDirectory: Send + Sync + Debug {
    fn contains(&self, partner_id: &str) -> bool;
}

/// Directory used when none is configured: every partner id is accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenDirectory;

impl PartnerDirectory for OpenDirectory {
    fn contains(&self, _partner_id: &str) -> bool {
        true
    }
}

impl PartnerDirectory for HashSet<String> {
    fn contains(&self, partner_id: &str) -> bool {
        HashSet::contains(self, partner_id)
    }
}
