//! Fund-flow analysis: does control come back to the originator?
//!
//! Routed DeFi activity usually sends proceeds back to the caller, while MEV
//! extraction contracts usually keep them. This discriminates, it does not
//! prove.

use crate::types::FlattenedCall;

/// Index of the first call whose target is `origin`, ignoring case.
///
/// Top-level calls are part of the scan.
pub fn find_return_to_origin(flattened: &[FlattenedCall], origin: &str) -> Option<usize> {
    flattened
        .iter()
        .position(|call| call.to.eq_ignore_ascii_case(origin))
}

/// True if any call in the flattened trace targets `origin`.
pub fn returns_to_origin(flattened: &[FlattenedCall], origin: &str) -> bool {
    find_return_to_origin(flattened, origin).is_some()
}
