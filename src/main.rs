use log::warn;
use query_logs::{
    cli, shutdown, ConsoleLogger, Poller, Printer, StartupError, SystemClock, TenantClient,
};
use std::{io, process};

fn exit_with(err: StartupError) -> ! {
    for line in err.diagnostics() {
        println!("{}", line);
    }
    process::exit(err.exit_code())
}

fn main() {
    let config = cli::parse().unwrap_or_else(|err| exit_with(err));

    if let Err(e) = ConsoleLogger::init(config.logging_config.clone()) {
        println!("WARNING: logging disabled: {}", e);
    }

    let client = TenantClient::connect(&config).unwrap_or_else(|err| exit_with(err.into()));

    let (handle, signal) = shutdown::channel();
    if let Err(e) = shutdown::listen_for_signals(handle) {
        warn!("Signal handling unavailable, stop with SIGKILL: {}", e);
    }

    let printer = Printer::new(io::stdout());
    let mut poller = Poller::new(client, printer, config.filter, config.poll, SystemClock);
    poller.run(&signal);
}
