// src/engine/policy.rs

use crate::types::RestartPolicy;

/// Whether a daemon is stopped at the end of a poll cycle.
///
/// With the reference configuration the storage daemon uses `OnRebuild` and
/// the target daemon `EveryCycle`, so the target daemon is bounced on every
/// poll even when nothing changed.
pub fn decide_restart(policy: RestartPolicy, was_rebuilt: bool) -> bool {
    match policy {
        RestartPolicy::OnRebuild => was_rebuilt,
        RestartPolicy::EveryCycle => true,
    }
}
