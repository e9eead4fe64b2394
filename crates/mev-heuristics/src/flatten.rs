//! Call tree flattening.

use crate::types::{Call, FlattenedCall};

/// Flatten a call tree into pre-order.
///
/// Every call comes before all of its descendants and siblings keep their
/// order. Traversal uses a heap-allocated stack, so nesting depth never
/// touches the native stack.
///
/// # Arguments
/// * `calls` - Top-level calls of a trace
///
/// # Returns
/// One [`FlattenedCall`] per node of the tree
pub fn flatten_calls(calls: &[Call]) -> Vec<FlattenedCall> {
    let mut flattened = Vec::with_capacity(calls.len());
    let mut stack: Vec<&Call> = calls.iter().rev().collect();

    while let Some(call) = stack.pop() {
        flattened.push(FlattenedCall::from(call));
        // Reversed so the first child is popped next.
        stack.extend(call.children.iter().rev());
    }

    flattened
}
