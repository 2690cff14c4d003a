//! JSON-over-HTTP client for the platform's administration gateway.
//!
//! Every call is a POST of a small JSON body carrying the session id. Non-2xx
//! responses and undecodable payloads are rejections; everything ureq raises
//! before a response arrives is a transport failure.
use super::{Credentials, Endpoint, LoginMode, Member, MembershipStatus, Session};
use crate::actions::{ActionKind, ActionParams};
use crate::error::EndpointError;
use crate::node::{NodeId, NodeKind, NodeSet};
use crate::util::truncate_string;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY_BYTES: usize = 512;

/// `Endpoint` backed by the platform's HTTP gateway.
pub struct HttpEndpoint {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    mode: LoginMode,
}

#[derive(Deserialize)]
struct LoginResponse {
    session_id: String,
    user_id: i64,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session_id: &'a str,
}

#[derive(Serialize)]
struct ChildrenRequest<'a> {
    session_id: &'a str,
    parent: NodeId,
    kinds: &'a [NodeKind],
}

#[derive(Serialize)]
struct CoursesRequest<'a> {
    session_id: &'a str,
    user_id: i64,
    status: &'a [MembershipStatus],
}

#[derive(Serialize)]
struct ObjectRequest<'a> {
    session_id: &'a str,
    ref_id: NodeId,
}

#[derive(Serialize)]
struct ActionCall<'a> {
    session_id: &'a str,
    ref_id: NodeId,
    params: &'a ActionParams,
}

#[derive(Deserialize)]
struct StatusResponse {
    ok: bool,
}

#[derive(Deserialize)]
struct TitleResponse {
    title: String,
}

impl HttpEndpoint {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        route: &str,
        body: &B,
    ) -> Result<T, EndpointError> {
        let url = self.url(route);
        debug!(operation, url = %url, "calling platform");
        let mut response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|err| EndpointError::transport(operation, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.body_mut().read_to_string().unwrap_or_default();
            return Err(EndpointError::rejected(
                operation,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    truncate_string(text.trim(), MAX_ERROR_BODY_BYTES)
                ),
            ));
        }
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|err| EndpointError::rejected(operation, format!("malformed response: {err}")))
    }
}

impl Endpoint for HttpEndpoint {
    fn login(&self, credentials: &Credentials) -> Result<Session, EndpointError> {
        if credentials.mode == LoginMode::Cas {
            return Err(EndpointError::rejected("login", "CAS login is not supported"));
        }
        let request = LoginRequest {
            client_id: &credentials.client_id,
            username: &credentials.username,
            password: &credentials.password,
            mode: credentials.mode,
        };
        let response: LoginResponse = self.call("login", "login", &request)?;
        if response.session_id.trim().is_empty() {
            return Err(EndpointError::rejected("login", "empty session id"));
        }
        Ok(Session {
            id: response.session_id,
            user_id: response.user_id,
        })
    }

    fn logout(&self, session: &Session) -> Result<bool, EndpointError> {
        let request = SessionRequest {
            session_id: &session.id,
        };
        let response: StatusResponse = self.call("logout", "logout", &request)?;
        Ok(response.ok)
    }

    fn list_children(
        &self,
        session: &Session,
        parent: NodeId,
        kinds: &[NodeKind],
    ) -> Result<NodeSet, EndpointError> {
        let request = ChildrenRequest {
            session_id: &session.id,
            parent,
            kinds,
        };
        self.call("list_children", "objects/children", &request)
    }

    fn list_courses_for_user(
        &self,
        session: &Session,
        user_id: i64,
        status: &[MembershipStatus],
    ) -> Result<NodeSet, EndpointError> {
        let request = CoursesRequest {
            session_id: &session.id,
            user_id,
            status,
        };
        self.call("list_courses_for_user", "users/courses", &request)
    }

    fn perform_single_item_action(
        &self,
        session: &Session,
        action: ActionKind,
        node: NodeId,
        params: &ActionParams,
    ) -> Result<bool, EndpointError> {
        let request = ActionCall {
            session_id: &session.id,
            ref_id: node,
            params,
        };
        let route = format!("actions/{}", action.id());
        let response: StatusResponse = self.call("perform_action", &route, &request)?;
        Ok(response.ok)
    }

    fn object_title(&self, session: &Session, node: NodeId) -> Result<String, EndpointError> {
        let request = ObjectRequest {
            session_id: &session.id,
            ref_id: node,
        };
        let response: TitleResponse = self.call("object_title", "objects/title", &request)?;
        Ok(response.title)
    }

    fn group_members(
        &self,
        session: &Session,
        group: NodeId,
    ) -> Result<Vec<Member>, EndpointError> {
        let request = ObjectRequest {
            session_id: &session.id,
            ref_id: group,
        };
        self.call("group_members", "groups/members", &request)
    }
}
