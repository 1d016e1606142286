use crate::{
    auth::Credentials,
    client::{Config, Tenant},
    error::{MissingFlag, StartupError},
    filter::build_filter,
    logger::LoggingConfig,
    poll::PollConfig,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::{ffi::OsString, time::Duration};

/// User-facing CLI arguments. Every long flag may also be written with a single dash.
#[derive(Parser, Debug)]
#[command(
    name = "query-logs",
    version,
    about = "Poll a tenant's log-search API and print new log records as they arrive"
)]
struct Args {
    /// The hostname of the tenant
    #[arg(long = "hostname", env = "QUERY_LOGS_HOSTNAME")]
    hostname: Option<String>,

    /// API credentials - client ID
    #[arg(long = "clientID", env = "QUERY_LOGS_CLIENT_ID")]
    client_id: Option<String>,

    /// API credentials - client secret
    #[arg(long = "clientSecret", env = "QUERY_LOGS_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// The trace ID to filter for
    #[arg(long = "traceID")]
    trace_id: Option<String>,

    /// The span ID to filter for
    #[arg(long = "spanID")]
    span_id: Option<String>,

    /// The severity level to filter for
    #[arg(long = "severity")]
    severity: Option<String>,

    /// Other custom filters, in the form "<key>=<value>&<key>=<value>"
    #[arg(long = "filter")]
    filter: Option<String>,

    /// Seconds to wait between polls
    #[arg(long = "interval", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Minutes of history to fetch on the first poll
    #[arg(long = "lookback", default_value_t = 30)]
    lookback: u64,

    /// Maximum number of records per query
    #[arg(long = "limit", default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// Timeout in seconds for each HTTP request
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Diagnostic log level (off, error, warn, info, debug, trace)
    #[arg(long = "logLevel", default_value = "info")]
    log_level: LevelFilter,
}

/// Parse the process arguments into a run configuration.
pub fn parse() -> Result<Config, StartupError> {
    parse_from(std::env::args_os())
}

/// Parse `args` (program name first). Performs no I/O beyond printing help or version.
pub fn parse_from<I, T>(args: I) -> Result<Config, StartupError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = normalize_flags(args.into_iter().map(Into::into));
    let args = match Args::try_parse_from(args) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return Err(StartupError::Usage(e.to_string())),
    };
    args.into_config()
}

/// Rewrite `-flag` and `-flag=value` to their double-dash form for every known long flag.
fn normalize_flags(args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    let command = Args::command();
    let longs: Vec<&str> = command.get_arguments().filter_map(|a| a.get_long()).collect();

    args.map(|arg| {
        let rewritten = arg.to_str().and_then(|s| {
            let rest = s.strip_prefix('-').filter(|r| !r.starts_with('-'))?;
            let name = rest.split('=').next().unwrap_or(rest);
            if longs.contains(&name) || name == "help" || name == "version" {
                Some(OsString::from(format!("-{}", s)))
            } else {
                None
            }
        });
        rewritten.unwrap_or(arg)
    })
    .collect()
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Args {
    fn into_config(self) -> Result<Config, StartupError> {
        let hostname = present(self.hostname);
        let client_id = present(self.client_id);
        let client_secret = present(self.client_secret);

        let mut missing = Vec::new();
        if hostname.is_none() {
            missing.push(MissingFlag::Hostname);
        }
        if client_id.is_none() {
            missing.push(MissingFlag::ClientId);
        }
        if client_secret.is_none() {
            missing.push(MissingFlag::ClientSecret);
        }

        let (hostname, client_id, client_secret) = match (hostname, client_id, client_secret) {
            (Some(h), Some(id), Some(secret)) => (h, id, secret),
            _ => return Err(StartupError::MissingFlags(missing)),
        };

        let filter = build_filter(
            self.trace_id.as_deref(),
            self.span_id.as_deref(),
            self.severity.as_deref(),
            self.filter.as_deref(),
        )?;

        Ok(Config {
            tenant: Tenant::from_hostname(&hostname),
            credentials: Credentials {
                client_id,
                client_secret,
            },
            filter,
            poll: PollConfig {
                interval: Duration::from_secs(self.interval),
                lookback: Duration::from_secs(self.lookback.saturating_mul(60)),
                limit: self.limit,
                ..PollConfig::default()
            },
            request_timeout: Duration::from_secs(self.timeout),
            logging_config: LoggingConfig {
                level: self.log_level,
                ..LoggingConfig::default()
            },
            ..Config::default()
        })
    }
}
