//! HDU location: which observed HDUs a rule is checked against.

use crate::dictionary::{HduTarget, Rule};
use crate::header::ObservedHeader;

/// HDUs a rule applies to in one observed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetHdus {
    /// The rule is never checked against a physical HDU (`header: -999`).
    None,
    /// Specific HDUs. Empty when the declared HDU is absent from the file.
    Indices(Vec<u32>),
    /// Every HDU present in the file.
    All(Vec<u32>),
}

impl TargetHdus {
    /// Indices to search; empty for [`TargetHdus::None`].
    pub fn indices(&self) -> &[u32] {
        match self {
            TargetHdus::None => &[],
            TargetHdus::Indices(indices) | TargetHdus::All(indices) => indices,
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, TargetHdus::None)
    }

    /// True when the rule targets physical HDUs but none are present.
    pub fn is_empty(&self) -> bool {
        !self.is_not_applicable() && self.indices().is_empty()
    }
}

/// Resolve a rule's declared HDU against the observed file.
///
/// Named targets resolve through the EXTNAME values the header reader
/// supplied; every HDU carrying that EXTNAME is a candidate.
pub fn target_hdus(rule: &Rule, observed: &ObservedHeader) -> TargetHdus {
    match rule.header() {
        HduTarget::NotApplicable => TargetHdus::None,
        HduTarget::Index(index) => {
            if observed.contains(*index) {
                TargetHdus::Indices(vec![*index])
            } else {
                TargetHdus::Indices(Vec::new())
            }
        }
        HduTarget::ExtName(name) => TargetHdus::Indices(observed.indices_with_extname(name)),
        HduTarget::All => TargetHdus::All(observed.indices().collect()),
    }
}
