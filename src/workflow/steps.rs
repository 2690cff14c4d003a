//! Lifecycle behavior of each workflow state.
use super::{Event, State, Workflow};
use crate::actions::{ActionKind, ActionOutcome, ActionRequest, Executor};
use crate::context::ContextKey;
use crate::endpoint::{Endpoint, Session};
use crate::error::WorkflowError;
use crate::input;
use crate::node::{Node, NodeSet};
use crate::report::{self, ReportContext};
use crate::util::display_path;
use crate::walker::{self, WalkSpec};
use chrono::Local;
use tracing::{info, warn};

type StepResult<T = ()> = Result<T, WorkflowError>;

/// One state's lifecycle. Steps a state has no use for stay no-ops.
pub(super) trait Step {
    fn print_information(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn collect_data_for_execution(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn print_execution_choices(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn parse_execution_choices(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn print_execution_preview(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    /// Informational states have nothing to confirm.
    fn confirm(&self, _run: &mut Workflow<'_>) -> StepResult<bool> {
        Ok(true)
    }

    fn execute(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn print_execution_summary(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn print_transition_choices(&self, _run: &mut Workflow<'_>) -> StepResult {
        Ok(())
    }

    fn parse_transition_choice(&self, run: &mut Workflow<'_>) -> StepResult<Event>;
}

pub(super) fn step_for(state: State) -> &'static dyn Step {
    match state {
        State::Start => &StartStep,
        State::Login => &LoginStep,
        State::ChooseCourse => &ChooseCourseStep,
        State::ChooseAction => &ChooseActionStep,
        State::ExecuteAction => &ExecuteActionStep,
        State::Quit => &QuitStep,
    }
}

fn require_session(session: &Option<Session>) -> StepResult<&Session> {
    session
        .as_ref()
        .ok_or_else(|| WorkflowError::Internal("no session established".to_string()))
}

fn selected_course(run: &Workflow<'_>) -> StepResult<Node> {
    run.context
        .single(ContextKey::SelectedCourse)
        .cloned()
        .ok_or_else(|| WorkflowError::Internal("no course selected".to_string()))
}

fn selected_groups(run: &Workflow<'_>) -> StepResult<NodeSet> {
    run.context
        .get(ContextKey::SelectedGroups)
        .cloned()
        .ok_or_else(|| WorkflowError::Internal("no groups selected".to_string()))
}

fn chosen_request(run: &Workflow<'_>) -> StepResult<ActionRequest> {
    run.request
        .clone()
        .ok_or_else(|| WorkflowError::Internal("no action parameters collected".to_string()))
}

fn pending_event(run: &mut Workflow<'_>) -> StepResult<Event> {
    run.pending_event
        .take()
        .ok_or_else(|| WorkflowError::Internal("state ended without a decision".to_string()))
}

fn listing(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| format!("  [{index}] {node}"))
        .collect()
}

fn say_all(run: &mut Workflow<'_>, lines: &[String]) -> StepResult {
    for line in lines {
        run.say(line)?;
    }
    Ok(())
}

/// Fetch titles for nodes the listing returned without one. A failed lookup
/// only costs the title.
fn enrich_titles(endpoint: &dyn Endpoint, session: &Session, nodes: &mut [Node]) {
    for node in nodes.iter_mut().filter(|node| node.needs_title()) {
        match endpoint.object_title(session, node.id) {
            Ok(title) => node.set_title(title),
            Err(err) => warn!(ref_id = node.id, error = %err, "title lookup failed"),
        }
    }
}

struct StartStep;

impl Step for StartStep {
    fn print_information(&self, run: &mut Workflow<'_>) -> StepResult {
        let line = format!(
            "Group administration for {} on client {}",
            run.credentials.username, run.credentials.client_id
        );
        run.say(&line)
    }

    fn parse_transition_choice(&self, _run: &mut Workflow<'_>) -> StepResult<Event> {
        Ok(Event::Begin)
    }
}

struct LoginStep;

impl Step for LoginStep {
    fn print_information(&self, run: &mut Workflow<'_>) -> StepResult {
        let line = format!(
            "Logging in as {} ({} login)...",
            run.credentials.username, run.credentials.mode
        );
        run.say(&line)
    }

    fn execute(&self, run: &mut Workflow<'_>) -> StepResult {
        let session = run
            .endpoint
            .login(&run.credentials)
            .map_err(WorkflowError::Authentication)?;
        info!(user_id = session.user_id, "logged in");
        run.session = Some(session);
        Ok(())
    }

    fn print_execution_summary(&self, run: &mut Workflow<'_>) -> StepResult {
        run.say("Logged in.")
    }

    fn parse_transition_choice(&self, _run: &mut Workflow<'_>) -> StepResult<Event> {
        Ok(Event::LoggedIn)
    }
}

struct ChooseCourseStep;

impl Step for ChooseCourseStep {
    fn print_information(&self, run: &mut Workflow<'_>) -> StepResult {
        let roles: Vec<&str> = run
            .settings
            .course_status
            .iter()
            .map(|status| status.as_str())
            .collect();
        let line = format!("Courses where you are {}:", roles.join(" or "));
        run.say(&line)
    }

    fn collect_data_for_execution(&self, run: &mut Workflow<'_>) -> StepResult {
        let session = require_session(&run.session)?;
        let mut courses = run
            .endpoint
            .list_courses_for_user(session, session.user_id, &run.settings.course_status)
            .map_err(|err| WorkflowError::discovery("courses", err))?;
        enrich_titles(run.endpoint, session, &mut courses);
        info!(courses = courses.len(), "courses discovered");
        run.context.replace(ContextKey::Courses, courses);
        Ok(())
    }

    fn print_execution_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let courses = run.context.get(ContextKey::Courses).cloned().unwrap_or_default();
        let mut lines = Vec::new();
        if courses.is_empty() {
            lines.push("No courses found.".to_string());
        }
        lines.extend(listing(&courses));
        lines.push(format!("  [{}] Quit", courses.len()));
        say_all(run, &lines)
    }

    fn parse_execution_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let count = run.context.get(ContextKey::Courses).map_or(0, Vec::len);
        let choice = input::single_choice(run.console, "Choose a course: ", count + 1)?;
        if choice == count {
            run.pending_event = Some(Event::QuitRequested);
            return Ok(());
        }
        let course = run.context.select(ContextKey::Courses, &[choice])?;
        run.context.replace(ContextKey::SelectedCourse, course);
        run.pending_event = Some(Event::CourseChosen);
        Ok(())
    }

    fn print_execution_preview(&self, run: &mut Workflow<'_>) -> StepResult {
        if run.pending_event != Some(Event::CourseChosen) {
            return Ok(());
        }
        let course = selected_course(run)?;
        run.say(&format!("Selected course: {course}"))
    }

    fn parse_transition_choice(&self, run: &mut Workflow<'_>) -> StepResult<Event> {
        pending_event(run)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    Action(ActionKind),
    OtherCourse,
    Quit,
}

impl MenuEntry {
    fn label(&self) -> &'static str {
        match self {
            MenuEntry::Action(kind) => kind.display_name(),
            MenuEntry::OtherCourse => "Choose another course",
            MenuEntry::Quit => "Quit",
        }
    }
}

/// Actions are only offered when there is something to apply them to.
fn action_menu(has_groups: bool) -> Vec<MenuEntry> {
    let mut menu = Vec::new();
    if has_groups {
        menu.extend(ActionKind::ALL.into_iter().map(MenuEntry::Action));
    }
    menu.push(MenuEntry::OtherCourse);
    menu.push(MenuEntry::Quit);
    menu
}

struct ChooseActionStep;

impl Step for ChooseActionStep {
    fn print_information(&self, run: &mut Workflow<'_>) -> StepResult {
        let course = selected_course(run)?;
        run.say(&format!("Course: {course}"))
    }

    fn collect_data_for_execution(&self, run: &mut Workflow<'_>) -> StepResult {
        let course = selected_course(run)?;
        let session = require_session(&run.session)?;
        let spec = WalkSpec::groups_in_folders(run.settings.max_folder_depth);
        let mut groups = walker::discover(run.endpoint, session, course.id, spec)
            .map_err(|err| WorkflowError::discovery(format!("groups in {course}"), err))?;
        enrich_titles(run.endpoint, session, &mut groups);
        info!(course = course.id, groups = groups.len(), "groups discovered");
        run.context.replace(ContextKey::Groups, groups);
        Ok(())
    }

    fn print_execution_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let groups = run.context.get(ContextKey::Groups).cloned().unwrap_or_default();
        let mut lines = Vec::new();
        if groups.is_empty() {
            lines.push("No groups found in this course.".to_string());
        } else {
            lines.push("Groups:".to_string());
            lines.extend(listing(&groups));
        }
        lines.push("Actions:".to_string());
        for (index, entry) in action_menu(!groups.is_empty()).iter().enumerate() {
            lines.push(format!("  [{index}] {}", entry.label()));
        }
        say_all(run, &lines)
    }

    /// The action is chosen first; groups are only asked for when an action
    /// will run, so leaving never requires a selection.
    fn parse_execution_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let group_count = run.context.get(ContextKey::Groups).map_or(0, Vec::len);
        let menu = action_menu(group_count > 0);
        let choice = input::single_choice(run.console, "Choose an action: ", menu.len())?;
        let entry = menu
            .get(choice)
            .copied()
            .ok_or_else(|| WorkflowError::Internal(format!("menu entry {choice} missing")))?;
        let event = match entry {
            MenuEntry::Action(kind) => {
                let picked = input::multi_choice(
                    run.console,
                    "Select groups (e.g. 0,2,4-6): ",
                    group_count,
                )?;
                let selected = run.context.select(ContextKey::Groups, &picked)?;
                run.context.replace(ContextKey::SelectedGroups, selected);
                run.chosen_action = Some(kind);
                Event::ActionChosen
            }
            MenuEntry::OtherCourse => {
                run.context.clear(ContextKey::SelectedCourse);
                Event::BackToCourses
            }
            MenuEntry::Quit => Event::QuitRequested,
        };
        run.pending_event = Some(event);
        Ok(())
    }

    fn parse_transition_choice(&self, run: &mut Workflow<'_>) -> StepResult<Event> {
        pending_event(run)
    }
}

const AFTER_ACTION_MENU: [(&str, Event); 3] = [
    ("Further actions on this course", Event::StayOnCourse),
    ("Choose another course", Event::BackToCourses),
    ("Quit", Event::QuitRequested),
];

struct ExecuteActionStep;

impl Step for ExecuteActionStep {
    fn print_information(&self, run: &mut Workflow<'_>) -> StepResult {
        let kind = run
            .chosen_action
            .ok_or_else(|| WorkflowError::Internal("no action chosen".to_string()))?;
        run.request = None;
        run.outcome = None;
        run.say(&format!("Action: {}", kind.display_name()))
    }

    fn parse_execution_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let kind = run
            .chosen_action
            .ok_or_else(|| WorkflowError::Internal("no action chosen".to_string()))?;
        let params = kind.collect_params(run.console)?;
        run.request = Some(ActionRequest::new(kind, params));
        Ok(())
    }

    fn print_execution_preview(&self, run: &mut Workflow<'_>) -> StepResult {
        let groups = selected_groups(run)?;
        let mut lines = vec![format!("The action applies to {} group(s):", groups.len())];
        lines.extend(groups.iter().map(|group| format!("  - {group}")));
        say_all(run, &lines)
    }

    fn confirm(&self, run: &mut Workflow<'_>) -> StepResult<bool> {
        let request = chosen_request(run)?;
        let groups = selected_groups(run)?;
        let session = require_session(&run.session)?;
        let executor = Executor::new(run.endpoint, session, run.settings.action_workers);
        let confirmed = executor.confirm(run.console, &request, &groups)?;
        if !confirmed {
            info!(action = %request.kind, "action declined by operator");
            run.outcome = Some(ActionOutcome::default());
        }
        Ok(confirmed)
    }

    fn execute(&self, run: &mut Workflow<'_>) -> StepResult {
        let request = chosen_request(run)?;
        let groups = selected_groups(run)?;
        let course = selected_course(run)?;
        let session = require_session(&run.session)?;

        let members = if run.settings.report_dir.is_some() && request.kind.affects_members() {
            report::snapshot_members(run.endpoint, session, &groups)
        } else {
            Vec::new()
        };
        let executor = Executor::new(run.endpoint, session, run.settings.action_workers);
        let outcome = executor.run(&request, &groups);

        let executed_at = Local::now();
        let report = ReportContext::for_action(&course, &request, &outcome, &members, executed_at);
        if let Some(dir) = run.settings.report_dir.clone() {
            let stem = format!("{}-{}", executed_at.format("%Y%m%d-%H%M%S"), request.kind.id());
            match report.write_to_dir(&dir, &stem) {
                Ok(path) => {
                    let cwd = std::env::current_dir().ok();
                    let shown = display_path(&path, cwd.as_deref());
                    info!(path = %shown, "report written");
                    run.say(&format!("Report written to {shown}"))?;
                }
                Err(err) => warn!(error = %format!("{err:#}"), "report not written"),
            }
        }

        run.summary.actions_executed += 1;
        run.summary.failed_items += outcome.failed.len();
        run.outcome = Some(outcome);
        run.last_report = Some(report);
        Ok(())
    }

    fn print_execution_summary(&self, run: &mut Workflow<'_>) -> StepResult {
        let lines = run
            .outcome
            .as_ref()
            .map(ActionOutcome::summary_lines)
            .unwrap_or_default();
        say_all(run, &lines)
    }

    fn print_transition_choices(&self, run: &mut Workflow<'_>) -> StepResult {
        let lines: Vec<String> = AFTER_ACTION_MENU
            .iter()
            .enumerate()
            .map(|(index, (label, _))| format!("  [{index}] {label}"))
            .collect();
        say_all(run, &lines)
    }

    fn parse_transition_choice(&self, run: &mut Workflow<'_>) -> StepResult<Event> {
        let choice = input::single_choice(run.console, "Continue with: ", AFTER_ACTION_MENU.len())?;
        run.chosen_action = None;
        run.request = None;
        let event = AFTER_ACTION_MENU
            .get(choice)
            .map(|(_, event)| *event)
            .ok_or_else(|| WorkflowError::Internal(format!("menu entry {choice} missing")))?;
        if event == Event::BackToCourses {
            run.context.clear(ContextKey::SelectedCourse);
        }
        Ok(event)
    }
}

struct QuitStep;

impl Step for QuitStep {
    fn execute(&self, run: &mut Workflow<'_>) -> StepResult {
        run.logout();
        Ok(())
    }

    fn print_execution_summary(&self, run: &mut Workflow<'_>) -> StepResult {
        run.say("Goodbye.")
    }

    fn parse_transition_choice(&self, _run: &mut Workflow<'_>) -> StepResult<Event> {
        Ok(Event::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn action_menu_hides_actions_without_groups() {
        assert_eq!(action_menu(false), vec![MenuEntry::OtherCourse, MenuEntry::Quit]);
        let menu = action_menu(true);
        assert_eq!(menu.len(), ActionKind::ALL.len() + 2);
        assert_eq!(menu[0], MenuEntry::Action(ActionKind::RemoveMembers));
        assert_eq!(menu.last(), Some(&MenuEntry::Quit));
    }

    #[test]
    fn listing_numbers_from_zero() {
        let nodes = vec![
            Node::new(5, NodeKind::Group, "Mon"),
            Node::new(9, NodeKind::Group, ""),
        ];
        assert_eq!(
            listing(&nodes),
            vec!["  [0] Mon (ref 5)".to_string(), "  [1] #9 (ref 9)".to_string()]
        );
    }
}
