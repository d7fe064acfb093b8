//! Command-line definition of the `mqutil` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mqutil")]
#[command(about = "Message queue utilities")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Google Cloud Pub/Sub utilities
    Pubsub(PubSubArgs),
}

#[derive(Args, Debug)]
pub struct PubSubArgs {
    /// GCP project id (required)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Pub/Sub emulator host, e.g. localhost:8085
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: PubSubCommands,
}

#[derive(Subcommand, Debug)]
pub enum PubSubCommands {
    /// Publish messages to a topic
    Produce(ProduceArgs),
    /// Print and acknowledge messages from a subscription
    Subscribe {
        subscription: String,
    },
    /// Manage the subscriptions of a topic
    Subs(SubsArgs),
    /// Manage topics
    Topics {
        #[command(subcommand)]
        command: TopicCommands,
    },
}

#[derive(Args, Debug)]
pub struct ProduceArgs {
    /// Topic to publish to
    #[arg(short, long, global = true, default_value = "local-test")]
    pub topic: String,

    #[command(subcommand)]
    pub command: ProduceCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProduceCommands {
    /// Publish a single message from a file or stdin
    One {
        /// File to read the message from; stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Run an HTTP server that publishes every POST /data body
    Svr {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Bind address (IP or hostname)
        #[arg(long, default_value = "0.0.0.0")]
        addr: String,
    },
}

#[derive(Args, Debug)]
pub struct SubsArgs {
    /// Topic the subscriptions belong to
    #[arg(short, long, global = true)]
    pub topic: Option<String>,

    #[command(subcommand)]
    pub command: SubsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SubsCommands {
    List,
    Create {
        #[arg(required = true)]
        subscriptions: Vec<String>,
    },
    Delete {
        #[arg(required = true)]
        subscriptions: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TopicCommands {
    List,
    /// Create topics; `name:sub1;sub2` also creates subscriptions on the topic
    Create {
        #[arg(required = true)]
        topics: Vec<String>,
    },
    /// Delete topics along with their subscriptions
    Delete {
        #[arg(required = true)]
        topics: Vec<String>,
    },
}
