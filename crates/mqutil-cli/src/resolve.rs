//! Turns parsed arguments into a validated, immutable [`Invocation`].
//!
//! Everything here runs before a session is opened, so a failure means no
//! remote call was made.

use std::path::PathBuf;
use std::str::FromStr;

use mqutil::SessionConfig;
use mqutil_http::RelayConfig;

use crate::cli::{
    Cli, Commands, ProduceCommands, PubSubArgs, PubSubCommands, SubsCommands, TopicCommands,
};
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub session: SessionConfig,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PublishOne {
        topic: String,
        /// Read from stdin when `None`.
        file: Option<PathBuf>,
    },
    PublishRelay {
        topic: String,
        relay: RelayConfig,
    },
    Subscribe {
        subscription: String,
    },
    ListTopics,
    CreateTopics {
        specs: Vec<TopicSpec>,
    },
    DeleteTopics {
        topics: Vec<String>,
    },
    ListSubscriptions {
        topic: String,
    },
    CreateSubscriptions {
        topic: String,
        subscriptions: Vec<String>,
    },
    DeleteSubscriptions {
        topic: String,
        subscriptions: Vec<String>,
    },
}

impl Command {
    /// Whether the command runs until a shutdown signal arrives.
    pub fn is_long_running(&self) -> bool {
        matches!(
            self,
            Command::PublishRelay { .. } | Command::Subscribe { .. }
        )
    }
}

/// A topic to create, with the subscriptions to attach to it.
///
/// Parsed from `name` or `name:sub1;sub2`. Empty subscription segments are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub topic: String,
    pub subscriptions: Vec<String>,
}

impl FromStr for TopicSpec {
    type Err = CliError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (topic, subscriptions) = spec.split_once(':').unwrap_or((spec, ""));
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(CliError::validation(
                "topic spec",
                format!("'{spec}' has an empty topic name"),
            ));
        }
        let subscriptions = subscriptions
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(TopicSpec {
            topic: topic.to_string(),
            subscriptions,
        })
    }
}

pub fn resolve(cli: Cli) -> Result<Invocation, CliError> {
    let Commands::Pubsub(args) = cli.command;
    resolve_pubsub(args)
}

fn resolve_pubsub(args: PubSubArgs) -> Result<Invocation, CliError> {
    let project = non_empty(args.project)
        .ok_or_else(|| CliError::validation("project", "required flag --project/-p not set"))?;
    let mut session = SessionConfig::new(project);
    if let Some(host) = non_empty(args.host) {
        session = session.with_emulator_host(host);
    }

    let command = match args.command {
        PubSubCommands::Produce(produce) => {
            let topic = required("topic", Some(produce.topic))?;
            match produce.command {
                ProduceCommands::One { file } => Command::PublishOne { topic, file },
                ProduceCommands::Svr { port, addr } => Command::PublishRelay {
                    topic,
                    relay: RelayConfig::new(addr, port),
                },
            }
        }
        PubSubCommands::Subscribe { subscription } => Command::Subscribe {
            subscription: required("subscription", Some(subscription))?,
        },
        PubSubCommands::Subs(subs) => {
            let topic = required("topic", subs.topic)?;
            match subs.command {
                SubsCommands::List => Command::ListSubscriptions { topic },
                SubsCommands::Create { subscriptions } => Command::CreateSubscriptions {
                    topic,
                    subscriptions: names("subscription", subscriptions)?,
                },
                SubsCommands::Delete { subscriptions } => Command::DeleteSubscriptions {
                    topic,
                    subscriptions: names("subscription", subscriptions)?,
                },
            }
        }
        PubSubCommands::Topics { command } => match command {
            TopicCommands::List => Command::ListTopics,
            TopicCommands::Create { topics } => Command::CreateTopics {
                specs: topics
                    .iter()
                    .map(|t| t.parse::<TopicSpec>())
                    .collect::<Result<Vec<_>, _>>()?,
            },
            TopicCommands::Delete { topics } => Command::DeleteTopics {
                topics: names("topic", topics)?,
            },
        },
    };

    Ok(Invocation { session, command })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str, value: Option<String>) -> Result<String, CliError> {
    non_empty(value).ok_or_else(|| CliError::validation(field, "must not be empty"))
}

fn names(field: &str, values: Vec<String>) -> Result<Vec<String>, CliError> {
    values
        .into_iter()
        .map(|v| required(field, Some(v)))
        .collect()
}
