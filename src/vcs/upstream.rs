// src/vcs/upstream.rs

/// Relationship between a local branch and its remote-tracking counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamState {
    /// Local and remote point at the same commit.
    UpToDate,
    /// Remote is strictly ahead; a fast-forward pull is available.
    PullNeeded,
    /// Local is strictly ahead; nothing to fetch.
    PushNeeded,
    /// Both sides have commits the other lacks.
    Diverged,
}

impl UpstreamState {
    /// Classify from the local head, remote head, and their merge-base.
    pub fn classify(local: &str, remote: &str, merge_base: &str) -> Self {
        if local == remote {
            UpstreamState::UpToDate
        } else if local == merge_base {
            UpstreamState::PullNeeded
        } else if remote == merge_base {
            UpstreamState::PushNeeded
        } else {
            UpstreamState::Diverged
        }
    }
}
