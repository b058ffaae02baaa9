//! Property tests for state evolution invariants.

use proptest::prelude::*;
use threadgraph::message::{Message, Role};
use threadgraph::node::NodeDelta;
use threadgraph::state::ConversationState;

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::Assistant),
        Just(Role::System),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), ".{0,16}").prop_map(|(role, content)| Message::new(role, content))
}

proptest! {
    /// Applying a delta never reorders, edits, or drops existing messages.
    #[test]
    fn apply_is_append_only(
        base in prop::collection::vec(arb_message(), 0..8),
        added in prop::collection::vec(arb_message(), 0..8),
    ) {
        let state = ConversationState::with_history("t", base.clone());
        let delta = NodeDelta::new().with_messages(added.clone());
        let next = state.apply(&delta);

        prop_assert_eq!(next.messages().len(), base.len() + added.len());
        prop_assert_eq!(&next.messages()[..base.len()], &base[..]);
        prop_assert_eq!(&next.messages()[base.len()..], &added[..]);
        // the original is untouched
        prop_assert_eq!(state.messages(), &base[..]);
    }

    /// Append returns a new value and leaves the receiver alone.
    #[test]
    fn append_has_value_semantics(
        base in prop::collection::vec(arb_message(), 0..8),
        message in arb_message(),
    ) {
        let state = ConversationState::with_history("t", base.clone());
        let next = state.append(message.clone());

        prop_assert_eq!(state.messages().len(), base.len());
        prop_assert_eq!(next.messages().len(), base.len() + 1);
        prop_assert_eq!(next.messages().last().unwrap(), &message);
        prop_assert_eq!(next.version(), state.version());
    }
}
