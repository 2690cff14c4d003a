//! Interactive administration workflow.
//!
//! The controller owns the active state, the session handle and the session
//! context. Every state runs the same lifecycle in a fixed order:
//!
//! 1. enter: `print_information`, `collect_data_for_execution`,
//!    `print_execution_choices`
//! 2. execute: `parse_execution_choices`, `print_execution_preview`,
//!    `confirm`, `execute` (skipped when not confirmed),
//!    `print_execution_summary`
//! 3. leave: `print_transition_choices`, `parse_transition_choice`, then the
//!    transition table picks the next state.
//!
//! Any error raised by a lifecycle step ends the state with `Event::Failed`,
//! which moves the workflow to `Quit`. `Quit` logs out and ends the run.
use crate::actions::{ActionKind, ActionOutcome, ActionRequest};
use crate::context::SessionContext;
use crate::endpoint::{Credentials, Endpoint, MembershipStatus, Session};
use crate::error::WorkflowError;
use crate::input::Console;
use crate::report::ReportContext;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

mod state;
mod steps;

pub use state::{transition, Event, State};

/// Settings the workflow reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub max_folder_depth: u32,
    pub course_status: Vec<MembershipStatus>,
    pub action_workers: usize,
    pub report_dir: Option<PathBuf>,
}

/// What happened during one run, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub visited: Vec<State>,
    pub actions_executed: usize,
    pub failed_items: usize,
    /// True when some state ended with an error rather than a choice.
    pub aborted: bool,
}

/// The state machine driving one interactive session.
///
/// Borrows the platform and the console for the whole run; owns everything
/// discovered or chosen along the way.
pub struct Workflow<'a> {
    endpoint: &'a dyn Endpoint,
    console: &'a mut dyn Console,
    credentials: Credentials,
    settings: WorkflowSettings,
    state: State,
    context: SessionContext,
    session: Option<Session>,
    /// Event decided while parsing execution choices, emitted on leave.
    pending_event: Option<Event>,
    chosen_action: Option<ActionKind>,
    request: Option<ActionRequest>,
    outcome: Option<ActionOutcome>,
    last_report: Option<ReportContext>,
    summary: RunSummary,
}

impl<'a> Workflow<'a> {
    pub fn new(
        endpoint: &'a dyn Endpoint,
        console: &'a mut dyn Console,
        credentials: Credentials,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            endpoint,
            console,
            credentials,
            settings,
            state: State::Start,
            context: SessionContext::new(),
            session: None,
            pending_event: None,
            chosen_action: None,
            request: None,
            outcome: None,
            last_report: None,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Report context of the most recently executed action.
    pub fn last_report(&self) -> Option<&ReportContext> {
        self.last_report.as_ref()
    }

    /// Drive the workflow until `Quit` has run.
    pub fn run(&mut self) -> RunSummary {
        loop {
            let state = self.state;
            self.summary.visited.push(state);
            debug!(state = %state, "entering state");
            let event = match self.drive(state) {
                Ok(event) => event,
                Err(err) => {
                    self.fail(state, &err);
                    Event::Failed
                }
            };
            debug!(state = %state, event = ?event, "leaving state");
            if state.is_terminal() {
                break;
            }
            self.state = match transition(state, event) {
                Some(next) => next,
                None => {
                    let err = WorkflowError::Internal(format!(
                        "no transition from {state} on {event:?}"
                    ));
                    self.fail(state, &err);
                    State::Quit
                }
            };
        }
        // Quit may have failed before reaching its logout.
        self.logout();
        std::mem::take(&mut self.summary)
    }

    fn drive(&mut self, state: State) -> Result<Event, WorkflowError> {
        let step = steps::step_for(state);
        self.pending_event = None;

        step.print_information(self)?;
        step.collect_data_for_execution(self)?;
        step.print_execution_choices(self)?;

        step.parse_execution_choices(self)?;
        step.print_execution_preview(self)?;
        if step.confirm(self)? {
            step.execute(self)?;
        }
        step.print_execution_summary(self)?;

        step.print_transition_choices(self)?;
        step.parse_transition_choice(self)
    }

    fn fail(&mut self, state: State, err: &WorkflowError) {
        error!(state = %state, error = %err, "state failed");
        self.summary.aborted = true;
        // The console itself may be what failed; nothing more to do then.
        let _ = self.console.say(&format!("Error: {err}"));
    }

    /// Best-effort logout. Failures are logged, never raised.
    fn logout(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match self.endpoint.logout(&session) {
            Ok(true) => info!(user_id = session.user_id, "logged out"),
            Ok(false) => warn!(user_id = session.user_id, "platform refused logout"),
            Err(err) => warn!(
                user_id = session.user_id,
                transport = err.is_transport(),
                error = %err,
                "logout failed"
            ),
        }
    }

    fn say(&mut self, line: &str) -> Result<(), WorkflowError> {
        self.console.say(line)?;
        Ok(())
    }
}
