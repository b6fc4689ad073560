//! Process-wide shared state: the stop flag every worker polls, the wake-port
//! registry used to unblock a blocking receiver, the exit-code high-water mark,
//! and the status-snapshot hooks SIGUSR1 fans out to.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

pub struct WorkerSnapshot {
    pub port: u16,
    pub q1_depth: usize,
    pub q2_depth: usize,
}

type StatusProvider = Box<dyn Fn() -> WorkerSnapshot + Send + Sync>;

pub struct DaemonContext {
    stop: Arc<AtomicBool>,
    exit_code: AtomicI32,
    wake_ports: Mutex<Vec<u16>>,
    status_providers: Mutex<Vec<StatusProvider>>,
}

impl DaemonContext {
    pub fn new() -> Arc<Self> {
        Arc::new(DaemonContext { stop: Arc::new(AtomicBool::new(false)), exit_code: AtomicI32::new(0), wake_ports: Mutex::new(Vec::new()), status_providers: Mutex::new(Vec::new()) })
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn register_port(&self, port: u16) {
        self.wake_ports.lock().unwrap().push(port);
    }

    pub fn register_status_provider<F>(&self, f: F)
    where
        F: Fn() -> WorkerSnapshot + Send + Sync + 'static,
    {
        self.status_providers.lock().unwrap().push(Box::new(f));
    }

    pub fn bump_exit_code(&self, code: i32) {
        self.exit_code.fetch_max(code, Ordering::AcqRel);
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::Acquire)
    }

    /// Sets the stop flag and sends a zero-byte UDP datagram to every
    /// registered port, unblocking any receiver parked in a blocking
    /// `recv_from`.
    pub fn request_graceful_stop(&self) {
        self.stop.store(true, Ordering::Release);
        for port in self.wake_ports.lock().unwrap().iter() {
            match UdpSocket::bind("0.0.0.0:0") {
                Ok(sock) => {
                    let _ = sock.send_to(&[], ("127.0.0.1", *port));
                }
                Err(e) => info!("could not open a wake-up socket for port {}: {}", port, e),
            }
        }
    }

    /// The already-running pipeline drains its own queues as each worker winds
    /// down; fast stop differs from graceful stop only in not waiting for
    /// that drain before signalling every worker to exit.
    pub fn request_fast_stop(&self) {
        self.request_graceful_stop();
    }

    pub fn log_status_snapshot(&self) {
        for provider in self.status_providers.lock().unwrap().iter() {
            let snap = provider();
            info!("status: port {} q1_depth={} q2_depth={}", snap.port, snap.q1_depth, snap.q2_depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_keeps_the_high_water_mark() {
        let ctx = DaemonContext::new();
        ctx.bump_exit_code(1);
        ctx.bump_exit_code(0);
        ctx.bump_exit_code(2);
        assert_eq!(ctx.exit_code(), 2);
    }

    #[test]
    fn graceful_stop_sets_the_shared_flag() {
        let ctx = DaemonContext::new();
        let flag = ctx.stop_flag();
        assert!(!flag.load(Ordering::Acquire));
        ctx.request_graceful_stop();
        assert!(flag.load(Ordering::Acquire));
    }
}
