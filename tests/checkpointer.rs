use threadgraph::message::Message;
use threadgraph::runtimes::{Checkpointer, CheckpointerError, InMemoryCheckpointer};
use threadgraph::state::ConversationState;

fn two_message_state(thread_id: &str) -> ConversationState {
    ConversationState::new(thread_id)
        .append(Message::user("hi"))
        .append(Message::assistant("hello"))
}

#[tokio::test]
async fn save_and_load_roundtrip() {
    let store = InMemoryCheckpointer::new();
    let state = two_message_state("t1");

    let version = store.save(&state, 0).await.unwrap();
    assert_eq!(version, 1);

    let loaded = store.load("t1").await.unwrap().unwrap();
    assert_eq!(loaded.thread_id, "t1");
    assert_eq!(loaded.state.version(), 1);
    assert_eq!(loaded.state.messages(), state.messages());
}

#[tokio::test]
async fn load_of_unknown_thread_is_none() {
    let store = InMemoryCheckpointer::new();
    assert!(store.load("unknown-thread").await.unwrap().is_none());
}

#[tokio::test]
async fn versions_increase_by_one_per_save() {
    let store = InMemoryCheckpointer::new();
    let mut state = two_message_state("t1");

    for expected in 0..5_u64 {
        let version = store.save(&state, expected).await.unwrap();
        assert_eq!(version, expected + 1);
        state = store.load("t1").await.unwrap().unwrap().state;
        assert_eq!(state.version(), version);
    }
}

#[tokio::test]
async fn stale_insert_is_a_conflict() {
    let store = InMemoryCheckpointer::new();
    let state = two_message_state("t1");
    store.save(&state, 0).await.unwrap();

    let err = store.save(&state, 0).await.unwrap_err();
    assert!(matches!(
        err,
        CheckpointerError::VersionConflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn stale_update_is_a_conflict_and_writes_nothing() {
    let store = InMemoryCheckpointer::new();
    let state = two_message_state("t1");
    store.save(&state, 0).await.unwrap();
    store
        .save(&state.append(Message::user("more")), 1)
        .await
        .unwrap();

    // A writer still holding version 1 loses.
    let stale = state.append(Message::user("stale overwrite"));
    let err = store.save(&stale, 1).await.unwrap_err();
    assert!(matches!(
        err,
        CheckpointerError::VersionConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));

    // The winner's write is intact.
    let loaded = store.load("t1").await.unwrap().unwrap();
    assert_eq!(loaded.state.version(), 2);
    assert_eq!(loaded.state.messages().last().unwrap().content, "more");
}

#[tokio::test]
async fn list_threads_reports_saved_ids() {
    let store = InMemoryCheckpointer::new();
    store.save(&two_message_state("alpha"), 0).await.unwrap();
    store.save(&two_message_state("beta"), 0).await.unwrap();

    let mut ids = store.list_threads().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["alpha", "beta"]);
}
