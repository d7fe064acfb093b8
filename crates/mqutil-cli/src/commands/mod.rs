//! Command bodies, each run inside one Pub/Sub session.

pub mod produce;
pub mod subscribe;
pub mod subscriptions;
pub mod topics;

use mqutil::{Connector, Session, signal_token, with_session};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CliError;
use crate::output::Output;
use crate::resolve::{Command, Invocation};

/// Run a resolved invocation. Long-running commands stop on SIGINT/SIGTERM.
pub async fn run(
    invocation: Invocation,
    connector: &dyn Connector,
    out: &Output,
) -> Result<(), CliError> {
    let cancel = if invocation.command.is_long_running() {
        signal_token().map_err(|e| CliError::io("install signal handlers", e))?
    } else {
        CancellationToken::new()
    };
    run_until(invocation, connector, out, cancel).await
}

/// Run a resolved invocation, stopping long-running commands when `cancel`
/// fires.
pub async fn run_until(
    invocation: Invocation,
    connector: &dyn Connector,
    out: &Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let Invocation { session, command } = invocation;
    debug!(project_id = %session.project, command = ?command, "Running command");
    with_session(connector, &session, async move |session: &Session| {
        execute(session, command, out, cancel).await
    })
    .await
}

async fn execute(
    session: &Session,
    command: Command,
    out: &Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let service = session.service();
    match command {
        Command::PublishOne { topic, file } => {
            produce::publish_one(service, &topic, file.as_deref(), out).await
        }
        Command::PublishRelay { topic, relay } => {
            produce::publish_relay(service, &topic, &relay, cancel).await
        }
        Command::Subscribe { subscription } => {
            subscribe::subscribe(service, &subscription, out.clone(), cancel).await
        }
        Command::ListTopics => topics::list(service, out).await,
        Command::CreateTopics { specs } => topics::create(service, &specs, out).await,
        Command::DeleteTopics { topics: names } => topics::delete(service, &names, out).await,
        Command::ListSubscriptions { topic } => subscriptions::list(service, &topic, out).await,
        Command::CreateSubscriptions {
            topic,
            subscriptions: names,
        } => subscriptions::create(service, &topic, &names, out).await,
        Command::DeleteSubscriptions {
            topic,
            subscriptions: names,
        } => subscriptions::delete(service, &topic, &names, out).await,
    }
}
