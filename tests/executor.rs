mod common;

use common::{group, ids, session, Call, ScriptedConsole, ScriptedEndpoint};
use lms_groupadmin::actions::{ActionKind, ActionParams, ActionRequest, Executor};
use lms_groupadmin::node::NodeSet;

fn four_groups() -> NodeSet {
    vec![
        group(1, "Mon"),
        group(2, "Tue"),
        group(3, "Wed"),
        group(4, "Thu"),
    ]
}

fn remove_members() -> ActionRequest {
    ActionRequest::new(ActionKind::RemoveMembers, ActionParams::None)
}

#[test]
fn failures_do_not_stop_the_batch() {
    let endpoint = ScriptedEndpoint::new()
        .with_failing_action(2)
        .with_failing_action(4);
    let session = session();
    let outcome = Executor::new(&endpoint, &session, 1).run(&remove_members(), &four_groups());

    assert_eq!(endpoint.action_targets(), vec![1, 2, 3, 4]);
    assert_eq!(ids(&outcome.attempted), vec![1, 2, 3, 4]);
    assert_eq!(ids(&outcome.failed), vec![2, 4]);
    assert_eq!(outcome.succeeded_count(), 2);
    assert!(outcome.errors[&2].contains("permission denied"));

    let lines = outcome.summary_lines();
    assert_eq!(lines[0], "2 of 4 group(s) succeeded, 2 failed.");
    assert!(lines[1].contains("Tue [ref 2]"));
    assert!(lines[2].contains("Thu [ref 4]"));
}

#[test]
fn pooled_run_keeps_submission_order() {
    let endpoint = ScriptedEndpoint::new()
        .with_failing_action(2)
        .with_failing_action(4);
    let session = session();
    let outcome = Executor::new(&endpoint, &session, 3).run(&remove_members(), &four_groups());

    let mut targets = endpoint.action_targets();
    targets.sort_unstable();
    assert_eq!(targets, vec![1, 2, 3, 4]);
    assert_eq!(ids(&outcome.attempted), vec![1, 2, 3, 4]);
    assert_eq!(ids(&outcome.failed), vec![2, 4]);
}

#[test]
fn refused_action_counts_as_failure() {
    let endpoint = ScriptedEndpoint::new().with_refused_action(3);
    let session = session();
    let outcome = Executor::new(&endpoint, &session, 1).run(&remove_members(), &four_groups());
    assert_eq!(ids(&outcome.failed), vec![3]);
    assert_eq!(outcome.errors[&3], "platform reported failure");
}

#[test]
fn declined_confirmation_calls_nothing() {
    let endpoint = ScriptedEndpoint::new();
    let session = session();
    let mut console = ScriptedConsole::new(&["maybe", "n"]);
    let outcome = Executor::new(&endpoint, &session, 1)
        .perform(&mut console, &remove_members(), &four_groups())
        .expect("perform");

    assert!(outcome.is_empty());
    assert_eq!(outcome.summary_lines(), vec!["Nothing was executed."]);
    assert!(endpoint.calls().is_empty());
    assert!(console.output.contains("Remove every member from 4 group(s)?"));
    assert!(console.output.contains("Invalid input"));
}

#[test]
fn confirmed_action_forwards_parameters() {
    let endpoint = ScriptedEndpoint::new();
    let session = session();
    let mut console = ScriptedConsole::new(&["yes"]);
    let request = ActionRequest::new(
        ActionKind::SetMaxMembers,
        ActionParams::MaxMembers { limit: 12 },
    );
    let outcome = Executor::new(&endpoint, &session, 2)
        .perform(&mut console, &request, &four_groups()[..2])
        .expect("perform");

    assert_eq!(outcome.succeeded_count(), 2);
    let limited = |call: &Call| {
        matches!(
            call,
            Call::Action {
                kind: ActionKind::SetMaxMembers,
                params: ActionParams::MaxMembers { limit: 12 },
                ..
            }
        )
    };
    assert_eq!(endpoint.count(limited), 2);
}

#[test]
fn empty_selection_is_a_no_op() {
    let endpoint = ScriptedEndpoint::new();
    let session = session();
    let outcome = Executor::new(&endpoint, &session, 4).run(&remove_members(), &[]);
    assert!(outcome.is_empty());
    assert!(endpoint.calls().is_empty());
}
