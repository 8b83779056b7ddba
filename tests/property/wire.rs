//! Property tests for the line protocol.
//!
//! 1. Neither decoder panics on arbitrary input.
//! 2. Descriptions containing `:` survive the first-colon/last-colon rule
//!    in both directions.
//! 3. Completion flags parse leniently: only `true`, in any case, is true.

use proptest::prelude::*;
use taskboard_proto::codec;
use taskboard_proto::command::{self, ClientCommand};
use taskboard_proto::event::{self, ServerEvent};
use taskboard_proto::{TaskId, TaskRecord};

/// Single-line text, colons welcome.
fn arb_description() -> impl Strategy<Value = String> {
    "[^\r\n]{0,80}"
}

/// Usernames as the server would accept them into an event: no colon.
fn arb_username() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ .-]{1,20}"
}

proptest! {
    #[test]
    fn command_decode_never_panics(line in any::<String>()) {
        let _ = command::decode(&line);
    }

    #[test]
    fn event_decode_never_panics(line in any::<String>()) {
        let _ = event::decode(&line);
    }

    #[test]
    fn update_command_keeps_colons_in_description(
        id in any::<u64>(),
        description in arb_description(),
        completed in any::<bool>(),
    ) {
        let cmd = ClientCommand::Update { id: TaskId::new(id), description, completed };
        let line = command::encode(&cmd);
        prop_assert_eq!(command::decode(&line), Ok(cmd));
    }

    #[test]
    fn task_events_keep_colons_in_description(
        id in any::<u64>(),
        description in arb_description(),
        completed in any::<bool>(),
        author in arb_username(),
    ) {
        let record = TaskRecord::new(TaskId::new(id), description, completed, author);
        for ev in [ServerEvent::TaskAdded(record.clone()), ServerEvent::TaskUpdated(record)] {
            let line = event::encode(&ev);
            prop_assert_eq!(event::decode(&line), Ok(ev));
        }
    }

    #[test]
    fn add_command_description_is_verbatim(description in "[^\r\n]{0,40}[a-zA-Z0-9][^\r\n]{0,40}") {
        let line = format!("ADD:{description}");
        prop_assert_eq!(command::decode(&line), Ok(ClientCommand::Add { description }));
    }

    #[test]
    fn only_true_parses_as_true(field in "[a-zA-Z]{0,6}") {
        prop_assert_eq!(codec::parse_bool(&field), field.eq_ignore_ascii_case("true"));
    }

    #[test]
    fn online_list_preserves_order(users in prop::collection::vec(arb_username_no_comma(), 0..8)) {
        let ev = ServerEvent::ConnectOk { users };
        prop_assert_eq!(event::decode(&event::encode(&ev)), Ok(ev));
    }
}

fn arb_username_no_comma() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,12}"
}
