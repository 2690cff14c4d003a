//! Report context handed to document rendering.
//!
//! Keys are stable strings; values are scalars or ordered sequences of
//! scalars and records. Rendering itself happens elsewhere, this module only
//! assembles the context and optionally persists it as JSON.
use crate::actions::{ActionOutcome, ActionRequest};
use crate::endpoint::{Endpoint, Member, Session};
use crate::node::Node;
use crate::util::file_name_slug;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const KEY_COURSE: &str = "course";
pub const KEY_ACTION: &str = "action";
pub const KEY_EXECUTED_AT: &str = "executed_at";
pub const KEY_ATTEMPTED: &str = "attempted";
pub const KEY_FAILED: &str = "failed";
pub const KEY_MEMBERS: &str = "members";

const MAX_NAME_ATTEMPTS: usize = 1000;

/// A scalar, or an ordered sequence of scalars and records.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ReportValue {
    Text(String),
    Number(i64),
    List(Vec<ReportValue>),
    Record(BTreeMap<String, ReportValue>),
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        ReportValue::Text(value)
    }
}

impl From<i64> for ReportValue {
    fn from(value: i64) -> Self {
        ReportValue::Number(value)
    }
}

fn record<const N: usize>(fields: [(&str, ReportValue); N]) -> ReportValue {
    ReportValue::Record(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn node_record(node: &Node) -> ReportValue {
    record([
        ("id", node.id.into()),
        ("kind", node.kind.as_str().into()),
        ("title", node.label().into()),
    ])
}

/// Members of one group captured before an action touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembers {
    pub group: Node,
    pub members: Vec<Member>,
}

/// Capture member lists for `groups`. Groups whose lookup fails are logged
/// and left out; the snapshot never blocks the action.
pub fn snapshot_members(
    endpoint: &dyn Endpoint,
    session: &Session,
    groups: &[Node],
) -> Vec<GroupMembers> {
    let mut snapshot = Vec::with_capacity(groups.len());
    for group in groups {
        match endpoint.group_members(session, group.id) {
            Ok(members) => snapshot.push(GroupMembers {
                group: group.clone(),
                members,
            }),
            Err(err) => {
                warn!(ref_id = group.id, error = %err, "member snapshot failed");
            }
        }
    }
    snapshot
}

/// Named values describing one executed action.
#[derive(Debug, Default, Serialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct ReportContext {
    values: BTreeMap<String, ReportValue>,
}

impl ReportContext {
    pub fn insert(&mut self, key: &str, value: impl Into<ReportValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.values.get(key)
    }

    pub fn for_action(
        course: &Node,
        request: &ActionRequest,
        outcome: &ActionOutcome,
        members: &[GroupMembers],
        executed_at: DateTime<Local>,
    ) -> Self {
        let mut ctx = Self::default();
        ctx.insert(KEY_COURSE, node_record(course));
        ctx.insert(
            KEY_ACTION,
            record([
                ("id", request.kind.id().into()),
                ("name", request.kind.display_name().into()),
            ]),
        );
        ctx.insert(KEY_EXECUTED_AT, executed_at.to_rfc3339());
        ctx.insert(
            KEY_ATTEMPTED,
            ReportValue::List(outcome.attempted.iter().map(node_record).collect()),
        );
        let failed = outcome
            .failed
            .iter()
            .map(|node| {
                let detail = outcome.errors.get(&node.id).cloned().unwrap_or_default();
                record([
                    ("id", node.id.into()),
                    ("title", node.label().into()),
                    ("error", detail.into()),
                ])
            })
            .collect();
        ctx.insert(KEY_FAILED, ReportValue::List(failed));
        if !members.is_empty() {
            let table = members
                .iter()
                .map(|entry| {
                    let rows = entry
                        .members
                        .iter()
                        .map(|member| {
                            record([
                                ("user_id", member.user_id.into()),
                                ("login", member.login.as_str().into()),
                                ("name", member.name.as_str().into()),
                            ])
                        })
                        .collect();
                    record([
                        ("group", node_record(&entry.group)),
                        ("members", ReportValue::List(rows)),
                    ])
                })
                .collect();
            ctx.insert(KEY_MEMBERS, ReportValue::List(table));
        }
        ctx
    }

    /// Write the context as pretty JSON into `dir`, returning the file path.
    ///
    /// Existing reports are never replaced: a taken name gets a numeric
    /// suffix (`report-<stem>-2.json`, ...).
    pub fn write_to_dir(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let text = serde_json::to_string_pretty(self).context("serialize report context")?;
        let slug = file_name_slug(stem);
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let name = if attempt == 1 {
                format!("report-{slug}.json")
            } else {
                format!("report-{slug}-{attempt}.json")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(text.as_bytes())
                        .with_context(|| format!("write {}", path.display()))?;
                    return Ok(path);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err).with_context(|| format!("create {}", path.display()));
                }
            }
        }
        Err(anyhow!(
            "no free report name for `{slug}` in {} after {MAX_NAME_ATTEMPTS} attempts",
            dir.display()
        ))
    }
}
