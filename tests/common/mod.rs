//! Shared test infrastructure: a scripted platform and a scripted console.
#![allow(dead_code)]

use lms_groupadmin::actions::{ActionKind, ActionParams};
use lms_groupadmin::endpoint::{
    Credentials, Endpoint, LoginMode, Member, MembershipStatus, Session,
};
use lms_groupadmin::error::{ConsoleError, EndpointError};
use lms_groupadmin::input::Console;
use lms_groupadmin::node::{Node, NodeId, NodeKind, NodeSet};
use lms_groupadmin::workflow::WorkflowSettings;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

/// Remote calls observed by the scripted platform, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login,
    Logout,
    ListChildren { parent: NodeId, kinds: Vec<NodeKind> },
    ListCourses { user_id: i64 },
    Action { kind: ActionKind, node: NodeId, params: ActionParams },
    Title(NodeId),
    Members(NodeId),
}

/// In-memory platform whose answers are set up per test.
#[derive(Default)]
pub struct ScriptedEndpoint {
    courses: NodeSet,
    course_error: Option<EndpointError>,
    children: BTreeMap<(NodeId, &'static str), NodeSet>,
    failing_parents: BTreeSet<NodeId>,
    failing_actions: BTreeSet<NodeId>,
    refused_actions: BTreeSet<NodeId>,
    titles: BTreeMap<NodeId, String>,
    members: BTreeMap<NodeId, Vec<Member>>,
    login_error: Option<EndpointError>,
    logout_error: Option<EndpointError>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(mut self, courses: NodeSet) -> Self {
        self.courses = courses;
        self
    }

    pub fn with_course_error(mut self, err: EndpointError) -> Self {
        self.course_error = Some(err);
        self
    }

    pub fn with_children(mut self, parent: NodeId, kind: NodeKind, nodes: NodeSet) -> Self {
        self.children.insert((parent, kind.as_str()), nodes);
        self
    }

    pub fn with_failing_parent(mut self, parent: NodeId) -> Self {
        self.failing_parents.insert(parent);
        self
    }

    pub fn with_failing_action(mut self, node: NodeId) -> Self {
        self.failing_actions.insert(node);
        self
    }

    pub fn with_refused_action(mut self, node: NodeId) -> Self {
        self.refused_actions.insert(node);
        self
    }

    pub fn with_title(mut self, node: NodeId, title: &str) -> Self {
        self.titles.insert(node, title.to_string());
        self
    }

    pub fn with_members(mut self, group: NodeId, members: Vec<Member>) -> Self {
        self.members.insert(group, members);
        self
    }

    pub fn with_login_error(mut self, err: EndpointError) -> Self {
        self.login_error = Some(err);
        self
    }

    pub fn with_logout_error(mut self, err: EndpointError) -> Self {
        self.logout_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn action_targets(&self) -> Vec<NodeId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Action { node, .. } => Some(node),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl Endpoint for ScriptedEndpoint {
    fn login(&self, _credentials: &Credentials) -> Result<Session, EndpointError> {
        self.record(Call::Login);
        if let Some(err) = &self.login_error {
            return Err(err.clone());
        }
        Ok(Session {
            id: "sid-1".to_string(),
            user_id: 6,
        })
    }

    fn logout(&self, _session: &Session) -> Result<bool, EndpointError> {
        self.record(Call::Logout);
        match &self.logout_error {
            Some(err) => Err(err.clone()),
            None => Ok(true),
        }
    }

    fn list_children(
        &self,
        _session: &Session,
        parent: NodeId,
        kinds: &[NodeKind],
    ) -> Result<NodeSet, EndpointError> {
        self.record(Call::ListChildren {
            parent,
            kinds: kinds.to_vec(),
        });
        if self.failing_parents.contains(&parent) {
            return Err(EndpointError::transport("list_children", "connection reset"));
        }
        let mut found = Vec::new();
        for kind in kinds {
            if let Some(nodes) = self.children.get(&(parent, kind.as_str())) {
                found.extend(nodes.iter().cloned());
            }
        }
        Ok(found)
    }

    fn list_courses_for_user(
        &self,
        _session: &Session,
        user_id: i64,
        _status: &[MembershipStatus],
    ) -> Result<NodeSet, EndpointError> {
        self.record(Call::ListCourses { user_id });
        if let Some(err) = &self.course_error {
            return Err(err.clone());
        }
        Ok(self.courses.clone())
    }

    fn perform_single_item_action(
        &self,
        _session: &Session,
        action: ActionKind,
        node: NodeId,
        params: &ActionParams,
    ) -> Result<bool, EndpointError> {
        self.record(Call::Action {
            kind: action,
            node,
            params: params.clone(),
        });
        if self.failing_actions.contains(&node) {
            return Err(EndpointError::rejected("perform_action", "permission denied"));
        }
        Ok(!self.refused_actions.contains(&node))
    }

    fn object_title(&self, _session: &Session, node: NodeId) -> Result<String, EndpointError> {
        self.record(Call::Title(node));
        self.titles
            .get(&node)
            .cloned()
            .ok_or_else(|| EndpointError::rejected("object_title", "unknown object"))
    }

    fn group_members(
        &self,
        _session: &Session,
        group: NodeId,
    ) -> Result<Vec<Member>, EndpointError> {
        self.record(Call::Members(group));
        Ok(self.members.get(&group).cloned().unwrap_or_default())
    }
}

/// Console fed from a fixed list of lines. Running out of lines closes input.
#[derive(Default)]
pub struct ScriptedConsole {
    input: VecDeque<String>,
    pub output: String,
    pub reads: usize,
}

impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|line| line.to_string()).collect(),
            output: String::new(),
            reads: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self) -> Result<String, ConsoleError> {
        self.reads += 1;
        self.input.pop_front().ok_or(ConsoleError::Closed)
    }

    fn write_str(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.output.push_str(text);
        Ok(())
    }
}

pub fn course(id: NodeId, title: &str) -> Node {
    Node::new(id, NodeKind::Course, title)
}

pub fn group(id: NodeId, title: &str) -> Node {
    Node::new(id, NodeKind::Group, title)
}

pub fn folder(id: NodeId, title: &str) -> Node {
    Node::new(id, NodeKind::Folder, title)
}

pub fn session() -> Session {
    Session {
        id: "sid-1".to_string(),
        user_id: 6,
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        client_id: "uni".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        mode: LoginMode::Standard,
    }
}

pub fn settings() -> WorkflowSettings {
    WorkflowSettings {
        max_folder_depth: 3,
        course_status: vec![MembershipStatus::Admin],
        action_workers: 1,
        report_dir: None,
    }
}

pub fn ids(nodes: &[Node]) -> Vec<NodeId> {
    nodes.iter().map(|node| node.id).collect()
}
