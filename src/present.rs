//! Caller-side shaping of a catalog for display.
//!
//! `parse` never merges or reorders operations; these helpers are applied
//! by the CLI on request.

use std::collections::HashSet;

use crate::types::OperationDescriptor;

/// Drop operations repeating an earlier (source, name, SOAP action)
/// triple, compared case-insensitively. The first occurrence wins.
pub fn dedup_operations(operations: Vec<OperationDescriptor>) -> Vec<OperationDescriptor> {
    let mut seen = HashSet::new();
    operations
        .into_iter()
        .filter(|op| {
            seen.insert((
                op.source.to_lowercase(),
                op.name.to_lowercase(),
                op.soap_action.to_lowercase(),
            ))
        })
        .collect()
}

/// Sort operations by name, case-insensitively; ties keep catalog order.
pub fn sort_by_name(operations: &mut [OperationDescriptor]) {
    operations.sort_by_cached_key(|op| op.name.to_lowercase());
}
