//! Remote platform facade consumed by discovery and action execution.
//!
//! The workflow only sees the `Endpoint` trait; `HttpEndpoint` talks to the
//! platform's JSON gateway, tests script their own implementation.
use crate::actions::{ActionKind, ActionParams};
use crate::error::EndpointError;
use crate::node::{NodeId, NodeKind, NodeSet};
use serde::{Deserialize, Serialize};
use std::fmt;

mod http;

pub use http::HttpEndpoint;

/// Authentication backends the platform offers.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    #[default]
    Standard,
    Cas,
    Ldap,
}

impl LoginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMode::Standard => "standard",
            LoginMode::Cas => "cas",
            LoginMode::Ldap => "ldap",
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login data taken from configuration. `Debug` never shows the password.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub mode: LoginMode,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

/// Session handle obtained at login and attached to every later call.
///
/// Set once and never mutated; it is shared read-only between workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
}

/// Course membership roles used to filter the course listing.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Member,
    Tutor,
    Admin,
    Owner,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Member => "member",
            MembershipStatus::Tutor => "tutor",
            MembershipStatus::Admin => "admin",
            MembershipStatus::Owner => "owner",
        }
    }
}

/// Member of a group as listed for reports.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: i64,
    pub login: String,
    #[serde(default)]
    pub name: String,
}

/// Remote operations the workflow needs from the platform.
///
/// Every call after `login` carries the session it returned. Implementations
/// are shared read-only between action workers.
pub trait Endpoint: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<Session, EndpointError>;

    fn logout(&self, session: &Session) -> Result<bool, EndpointError>;

    /// Direct children of `parent` whose kind is in `kinds`.
    fn list_children(
        &self,
        session: &Session,
        parent: NodeId,
        kinds: &[NodeKind],
    ) -> Result<NodeSet, EndpointError>;

    fn list_courses_for_user(
        &self,
        session: &Session,
        user_id: i64,
        status: &[MembershipStatus],
    ) -> Result<NodeSet, EndpointError>;

    /// Apply one action to one node. `Ok(false)` means the platform declined
    /// without raising an error.
    fn perform_single_item_action(
        &self,
        session: &Session,
        action: ActionKind,
        node: NodeId,
        params: &ActionParams,
    ) -> Result<bool, EndpointError>;

    fn object_title(&self, session: &Session, node: NodeId) -> Result<String, EndpointError>;

    fn group_members(
        &self,
        session: &Session,
        group: NodeId,
    ) -> Result<Vec<Member>, EndpointError>;
}
