//! # graphite-cli
//!
//! `graphite-fetch`: query a Graphite render endpoint from the shell.
//!
//! The binary maps its arguments onto a [`graphite_render::ClientConfig`] and
//! a [`graphite_render::MetricRequest`], runs one fetch bound to a
//! cancellation token (fired by Ctrl-C), and prints the series as a table or
//! as render-shaped JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod fetch;
pub mod output;

pub use cli::{AggregateArg, Cli, Format};
pub use error::CliError;
pub use fetch::FetchCommand;
pub use output::OutputFormat;
