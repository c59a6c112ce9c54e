//! Unit tests for capability sets.

use rstest::rstest;

use super::*;

#[rstest]
#[case(Capabilities::NONE, "none")]
#[case(Capabilities::COMMAND, "command")]
#[case(Capabilities::QUERY | Capabilities::COMMAND, "command | query")]
#[case(
    Capabilities::RESULT_COMMAND | Capabilities::QUERY,
    "result_command | query"
)]
fn capabilities_render_their_members(#[case] capabilities: Capabilities, #[case] expected: &str) {
    assert_eq!(capabilities.to_string(), expected);
}

#[test]
fn union_counts_distinct_capabilities() {
    let both = Capabilities::COMMAND | Capabilities::QUERY | Capabilities::QUERY;
    assert_eq!(both.len(), 2);
    assert!(both.contains(Capabilities::QUERY));
    assert!(!both.contains(Capabilities::RESULT_COMMAND));
}

#[test]
fn empty_set_contains_nothing() {
    assert!(Capabilities::NONE.is_empty());
    assert!(!Capabilities::NONE.contains(Capabilities::NONE));
}

#[rstest]
#[case(RequestKind::PlainCommand, true)]
#[case(RequestKind::ResultCommand, true)]
#[case(RequestKind::Query, false)]
fn command_kinds_are_flagged(#[case] kind: RequestKind, #[case] expected: bool) {
    assert_eq!(kind.is_command(), expected);
}
