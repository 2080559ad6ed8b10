//! Exit codes of the `hlspcheck` binary. Part of the public contract.

pub const SUCCESS: i32 = 0;
pub const NON_COMPLIANT: i32 = 1; // Missing required keywords on an enforced axis
pub const INTERNAL_ERROR: i32 = 2; // Unreadable input, malformed headers, bad config
pub const DICTIONARY_ERROR: i32 = 3; // Dictionary not found or malformed
