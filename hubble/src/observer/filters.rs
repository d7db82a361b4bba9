//! Allow/deny predicate evaluation

use crate::domain::FilterFunc;

/// Whether `event` passes the allow and deny lists.
///
/// An empty allow list admits everything; otherwise at least one allow
/// predicate must match. No deny predicate may match.
pub fn apply<T>(allow: &[FilterFunc<T>], deny: &[FilterFunc<T>], event: &T) -> bool {
    (allow.is_empty() || allow.iter().any(|f| f(event))) && !deny.iter().any(|f| f(event))
}
