// tests/upstream_classify.rs

use proptest::prelude::*;
use buildwatch::vcs::UpstreamState;

fn commit() -> impl Strategy<Value = String> {
    "[0-9a-f]{7}"
}

#[test]
fn decision_table() {
    assert_eq!(UpstreamState::classify("a", "a", "a"), UpstreamState::UpToDate);
    assert_eq!(UpstreamState::classify("a", "b", "a"), UpstreamState::PullNeeded);
    assert_eq!(UpstreamState::classify("a", "b", "b"), UpstreamState::PushNeeded);
    assert_eq!(UpstreamState::classify("a", "b", "c"), UpstreamState::Diverged);
}

proptest! {
    #[test]
    fn equal_heads_are_up_to_date(head in commit(), base in commit()) {
        prop_assert_eq!(UpstreamState::classify(&head, &head, &base), UpstreamState::UpToDate);
    }

    #[test]
    fn local_at_merge_base_needs_pull(local in commit(), remote in commit()) {
        prop_assume!(local != remote);
        prop_assert_eq!(
            UpstreamState::classify(&local, &remote, &local),
            UpstreamState::PullNeeded
        );
    }

    #[test]
    fn remote_at_merge_base_needs_push(local in commit(), remote in commit()) {
        prop_assume!(local != remote);
        prop_assert_eq!(
            UpstreamState::classify(&local, &remote, &remote),
            UpstreamState::PushNeeded
        );
    }

    #[test]
    fn three_distinct_commits_diverge(local in commit(), remote in commit(), base in commit()) {
        prop_assume!(local != remote && local != base && remote != base);
        prop_assert_eq!(
            UpstreamState::classify(&local, &remote, &base),
            UpstreamState::Diverged
        );
    }
}
