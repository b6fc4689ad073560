//! Signal-driven control: SIGUSR1 logs a status snapshot, SIGHUP/SIGINT ask for
//! a graceful drain-and-stop, SIGTERM asks for a fast stop.

use std::sync::Arc;
use std::thread;

use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;

use crate::context::DaemonContext;
use crate::error::Result;

pub fn spawn(ctx: Arc<DaemonContext>) -> Result<()> {
    let mut signals = Signals::new([SIGUSR1, SIGHUP, SIGINT, SIGTERM])?;

    thread::Builder::new().name("Signals".to_string()).spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGUSR1 => ctx.log_status_snapshot(),
                SIGHUP | SIGINT => {
                    info!("received signal {}, draining and stopping", signal);
                    ctx.request_graceful_stop();
                }
                SIGTERM => {
                    info!("received SIGTERM, stopping");
                    ctx.request_fast_stop();
                }
                _ => {}
            }
        }
    })?;

    Ok(())
}
