pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod error;
pub mod filter;
pub mod logger;
pub mod model;
pub mod poll;
pub mod printer;
pub mod shutdown;

pub use crate::{
    auth::{AccessToken, Authenticator, Credentials},
    client::{Config, Tenant, TenantClient},
    error::{AuthError, FetchError, FilterError, StartupError, EXIT_STARTUP_FAILURE},
    filter::build_filter,
    logger::{ConsoleLogger, LoggingConfig},
    model::{Filter, FilterMatch, LogRecord, QueryWindow, SortOrder},
    poll::{Clock, LogSource, PollConfig, Poller, SystemClock, TickOutcome},
    printer::Printer,
};
