use super::*;
use pretty_assertions::assert_eq;

#[test]
fn append_log_preserves_dispatch_order() {
    let next = run_all(
        &state(),
        &[
            UiAction::AppendLog {
                entry: log("one", LogLevel::Info, 3),
            },
            UiAction::AppendLog {
                entry: log("two", LogLevel::Warn, 1),
            },
            UiAction::AppendLog {
                entry: log("three", LogLevel::Error, 2),
            },
        ],
    );
    let messages: Vec<&str> = next.logs.iter().map(|entry| entry.message.as_str()).collect();
    assert_eq!(messages, vec!["one", "two", "three"]);
}

#[test]
fn store_does_not_cap_log_growth() {
    let actions: Vec<UiAction> = (0..5_000)
        .map(|idx| UiAction::AppendLog {
            entry: log(&idx.to_string(), LogLevel::Debug, idx),
        })
        .collect();
    let next = run_all(&state(), &actions);
    assert_eq!(next.logs.len(), 5_000);
}

#[test]
fn clear_logs_empties_sequence_and_keeps_other_fields() {
    let before = run_all(
        &state(),
        &[
            UiAction::SetView {
                view: ViewType::Dashboard,
            },
            UiAction::AppendLog {
                entry: log("1", LogLevel::Info, 0),
            },
        ],
    );
    let next = reduce(&before, &UiAction::ClearLogs);
    assert!(next.logs.is_empty());
    assert_eq!(next.current_view, ViewType::Dashboard);

    let appended = reduce(
        &next,
        &UiAction::AppendLog {
            entry: log("2", LogLevel::Info, 1),
        },
    );
    assert_eq!(appended.logs.len(), 1);
}
