//! Permission and precondition gates.

/// Authorizes an action against a node's declared permission requirements.
///
/// Identity resolution happens upstream; the kernel only compares the
/// requester's precomputed capability tokens against the node's required
/// set. A denial is a recoverable `noPerm` outcome, never a failure.
pub struct PermissionValidator;

impl PermissionValidator {
    /// Empty requirements are unrestricted; otherwise every required token
    /// must be among the granted ones.
    pub fn authorize(required: &[String], granted: &[String]) -> bool {
        required.iter().all(|token| granted.contains(token))
    }
}

/// Optimistic-concurrency check against a node's version.
///
/// Standard compare-and-swap semantics: a writer must observe the version
/// it intends to replace. A mismatch is a `noMatch` outcome and performs
/// no mutation.
pub struct PreconditionValidator;

impl PreconditionValidator {
    /// A packet without `ifTag` always satisfies; with one, the node's
    /// current version must equal it.
    pub fn check(version: u64, if_tag: Option<u64>) -> bool {
        if_tag.map_or(true, |tag| tag == version)
    }
}
