use super::{ActionOutcome, ActionRequest};
use crate::endpoint::{Endpoint, Session};
use crate::error::ConsoleError;
use crate::input::{self, Console};
use crate::node::Node;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::{info, warn};

/// Upper bound on concurrent per-node calls against the platform.
pub const MAX_ACTION_WORKERS: usize = 8;

/// Runs one action over a node set, one remote call per node.
///
/// A failing node never stops the batch; every failure lands in the outcome.
pub struct Executor<'a> {
    endpoint: &'a dyn Endpoint,
    session: &'a Session,
    workers: usize,
}

impl<'a> Executor<'a> {
    pub fn new(endpoint: &'a dyn Endpoint, session: &'a Session, workers: usize) -> Self {
        Self {
            endpoint,
            session,
            workers: workers.clamp(1, MAX_ACTION_WORKERS),
        }
    }

    pub fn confirm(
        &self,
        console: &mut dyn Console,
        request: &ActionRequest,
        nodes: &[Node],
    ) -> Result<bool, ConsoleError> {
        input::yes_no(console, &request.confirmation_text(nodes.len()))
    }

    /// Confirm with the operator, then run. A declined confirmation yields an
    /// empty outcome.
    pub fn perform(
        &self,
        console: &mut dyn Console,
        request: &ActionRequest,
        nodes: &[Node],
    ) -> Result<ActionOutcome, ConsoleError> {
        if !self.confirm(console, request, nodes)? {
            info!(action = %request.kind, "action declined by operator");
            return Ok(ActionOutcome::default());
        }
        Ok(self.run(request, nodes))
    }

    pub fn run(&self, request: &ActionRequest, nodes: &[Node]) -> ActionOutcome {
        info!(
            action = %request.kind,
            groups = nodes.len(),
            workers = self.workers,
            "executing action"
        );
        let results: Vec<Result<(), String>> = if self.workers == 1 || nodes.len() < 2 {
            nodes
                .iter()
                .map(|node| self.apply_one(request, node))
                .collect()
        } else {
            self.run_pooled(request, nodes)
        };

        let mut outcome = ActionOutcome::default();
        for (node, result) in nodes.iter().zip(results) {
            match result {
                Ok(()) => outcome.record_success(node.clone()),
                Err(detail) => outcome.record_failure(node.clone(), detail),
            }
        }
        info!(
            action = %request.kind,
            attempted = outcome.attempted.len(),
            failed = outcome.failed.len(),
            "action finished"
        );
        outcome
    }

    fn run_pooled(&self, request: &ActionRequest, nodes: &[Node]) -> Vec<Result<(), String>> {
        let next = AtomicUsize::new(0);
        let next = &next;
        let (tx, rx) = mpsc::channel();
        thread::scope(|scope| {
            for _ in 0..self.workers.min(nodes.len()) {
                let tx = tx.clone();
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(node) = nodes.get(index) else {
                        break;
                    };
                    let result = self.apply_one(request, node);
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut indexed: Vec<(usize, Result<(), String>)> = rx.into_iter().collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    fn apply_one(&self, request: &ActionRequest, node: &Node) -> Result<(), String> {
        match self.endpoint.perform_single_item_action(
            self.session,
            request.kind,
            node.id,
            &request.params,
        ) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(action = %request.kind, ref_id = node.id, "platform reported failure");
                Err("platform reported failure".to_string())
            }
            Err(err) => {
                warn!(
                    action = %request.kind,
                    ref_id = node.id,
                    transport = err.is_transport(),
                    error = %err,
                    "action failed"
                );
                Err(err.to_string())
            }
        }
    }
}
