//! Command-line configuration for the `taskboard` client.

/// Default server address.
pub const DEFAULT_SERVER: &str = "127.0.0.1:8080";

/// CLI arguments for the client binary.
#[derive(clap::Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about = "Collaborative task board client")]
pub struct CliArgs {
    /// Server address as `host:port`.
    #[arg(short, long, default_value = DEFAULT_SERVER, env = "TASKBOARD_SERVER")]
    pub server: String,

    /// Username to join as. Prompted for when omitted.
    #[arg(short, long, env = "TASKBOARD_USER")]
    pub user: Option<String>,

    /// Log level filter (trace, debug, info, warn, error). Logs go to stderr.
    #[arg(long, default_value = "warn", env = "TASKBOARD_LOG")]
    pub log_level: String,
}
