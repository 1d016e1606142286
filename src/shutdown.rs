//! Cooperative shutdown for the poll loop.
//!
//! The loop waits on a [`ShutdownSignal`] between ticks instead of sleeping,
//! so a [`ShutdownHandle`] can end it promptly. [`listen_for_signals`] wires
//! SIGINT and SIGTERM to a handle.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, info};
use std::{cell::Cell, io, thread, time::Duration};

#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        // A full channel already holds a pending request.
        let _ = self.sender.try_send(());
    }
}

#[derive(Debug)]
pub struct ShutdownSignal {
    receiver: Receiver<()>,
    fired: Cell<bool>,
}

pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (sender, receiver) = bounded(1);
    (
        ShutdownHandle { sender },
        ShutdownSignal {
            receiver,
            fired: Cell::new(false),
        },
    )
}

impl ShutdownSignal {
    /// Block for up to `timeout`. Returns true as soon as shutdown is requested.
    ///
    /// Dropping every handle without triggering does not count as a request.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.fired.get() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(()) => {
                self.fired.set(true);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                false
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        if !self.fired.get() && self.receiver.try_recv().is_ok() {
            self.fired.set(true);
        }
        self.fired.get()
    }
}

/// Trigger `handle` on the first SIGINT or SIGTERM.
pub fn listen_for_signals(handle: ShutdownHandle) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let ctrl_c = tokio::signal::ctrl_c();

                #[cfg(unix)]
                let terminate = async {
                    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(mut sigterm) => {
                            sigterm.recv().await;
                        }
                        Err(e) => {
                            error!("Failed to install SIGTERM handler: {}", e);
                            std::future::pending::<()>().await
                        }
                    }
                };

                #[cfg(not(unix))]
                let terminate = std::future::pending::<()>();

                tokio::select! {
                    res = ctrl_c => match res {
                        Ok(()) => info!("Received SIGINT (Ctrl+C)"),
                        Err(e) => {
                            error!("Failed to install Ctrl+C handler: {}", e);
                            return;
                        }
                    },
                    _ = terminate => info!("Received SIGTERM"),
                }
                handle.trigger();
            });
        })?;
    Ok(())
}
