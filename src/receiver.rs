//! UDP ingress: socket setup, the recyclable buffer pool, and the free-list /
//! read-list batching discipline that feeds Q1.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{IpfixdError, Result};
use crate::queue::BatchQueue;

pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;
pub const DEFAULT_POOL_SIZE: usize = 50_000;

const RECV_BUFFER_START: usize = 32 * 1024 * 1024;
const RECV_BUFFER_FLOOR: usize = 2 * 1024;
const STALE_TIMEOUT: Duration = Duration::from_secs(2);

/// A fixed-capacity recyclable datagram buffer. `len` is the number of bytes
/// actually written by the last receive; the rest of `data` is stale.
pub struct Buffer {
    pub data: Vec<u8>,
    pub len: usize,
}

impl Buffer {
    fn new(capacity: usize) -> Self {
        Buffer { data: vec![0u8; capacity], len: 0 }
    }

    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

pub struct Datagram {
    pub peer_addr: Ipv4Addr,
    pub local_port: u16,
    pub buffer: Buffer,
}

impl Datagram {
    fn sentinel(local_port: u16, capacity: usize) -> Self {
        Datagram { peer_addr: Ipv4Addr::UNSPECIFIED, local_port, buffer: Buffer::new(capacity) }
    }

    pub fn is_sentinel(&self) -> bool {
        self.buffer.len == 0
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum SocketMode {
    Blocking,
    Timeout,
    NonBlocking,
}

/// Raises SO_RCVBUF as high as the kernel will accept, halving from 32 MiB down
/// to a 2 KiB floor. Returns an error if even the floor is rejected.
fn configure_receive_buffer(socket: &Socket) -> Result<()> {
    let mut size = RECV_BUFFER_START;
    loop {
        if socket.set_recv_buffer_size(size).is_ok() {
            return Ok(());
        }
        if size <= RECV_BUFFER_FLOOR {
            return Err(IpfixdError::Configuration(format!("kernel rejected even the {} byte receive-buffer floor", RECV_BUFFER_FLOOR)));
        }
        size /= 2;
    }
}

fn bind_socket(port: u16) -> Result<UdpSocket> {
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(|source| IpfixdError::Bind { addr, source })?;
    socket.set_reuse_address(true).map_err(|source| IpfixdError::Bind { addr, source })?;
    configure_receive_buffer(&socket)?;
    socket.bind(&addr.into()).map_err(|source| IpfixdError::Bind { addr, source })?;
    Ok(socket.into())
}

pub struct Receiver {
    local_port: u16,
    socket: UdpSocket,
    pool_size: usize,
    buffer_capacity: usize,
    max_queue_size: usize,
    q1: Arc<BatchQueue<Datagram>>,
    free_return: Arc<BatchQueue<Buffer>>,
    stop: Arc<AtomicBool>,
    mode: SocketMode,
}

impl Receiver {
    pub fn bind(local_port: u16, pool_size: usize, max_queue_size: usize, q1: Arc<BatchQueue<Datagram>>, free_return: Arc<BatchQueue<Buffer>>, stop: Arc<AtomicBool>) -> Result<Self> {
        let socket = bind_socket(local_port)?;
        socket.set_nonblocking(false)?;
        Ok(Receiver { local_port, socket, pool_size, buffer_capacity: DEFAULT_BUFFER_CAPACITY, max_queue_size, q1, free_return, stop, mode: SocketMode::Blocking })
    }

    fn set_mode(&mut self, mode: SocketMode) -> Result<()> {
        if self.mode == mode {
            return Ok(());
        }
        match mode {
            SocketMode::Blocking => {
                self.socket.set_nonblocking(false)?;
                self.socket.set_read_timeout(None)?;
            }
            SocketMode::Timeout => {
                self.socket.set_nonblocking(false)?;
                self.socket.set_read_timeout(Some(STALE_TIMEOUT))?;
            }
            SocketMode::NonBlocking => {
                self.socket.set_nonblocking(true)?;
            }
        }
        self.mode = mode;
        Ok(())
    }

    pub fn run(&mut self) {
        let threshold = (self.pool_size / 16).max(1);
        let flush_half = (self.max_queue_size / 2).max(1);

        let mut free_list: VecDeque<Buffer> = (0..self.pool_size).map(|_| Buffer::new(self.buffer_capacity)).collect();
        let mut read_list: VecDeque<Datagram> = VecDeque::new();
        let mut last_flush = Instant::now();

        info!("receiver for port {} starting with pool size {}", self.local_port, self.pool_size);

        loop {
            if self.stop.load(Ordering::Acquire) {
                break;
            }

            let free_backlog = self.free_return.len();
            let desired_mode = if free_backlog >= threshold || read_list.len() >= threshold {
                SocketMode::NonBlocking
            } else if !read_list.is_empty() {
                SocketMode::Timeout
            } else {
                SocketMode::Blocking
            };

            if let Err(e) = self.set_mode(desired_mode) {
                error!("receiver for port {} failed to change socket mode: {}", self.local_port, e);
                break;
            }

            let mut buffer = match free_list.pop_front() {
                Some(b) => b,
                None => Buffer::new(self.buffer_capacity),
            };

            match self.socket.recv_from(&mut buffer.data) {
                Ok((nbytes, peer)) => {
                    if nbytes == 0 {
                        free_list.push_front(buffer);
                        continue; // self-addressed wake ping; loop re-checks the stop flag
                    }
                    buffer.len = nbytes;
                    let peer_addr = match peer.ip() {
                        IpAddr::V4(v4) => v4,
                        IpAddr::V6(_) => {
                            warn!("dropping datagram on port {} from unexpected IPv6 peer", self.local_port);
                            free_list.push_front(buffer);
                            continue;
                        }
                    };
                    read_list.push_back(Datagram { peer_addr, local_port: self.local_port, buffer });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                    free_list.push_front(buffer);

                    let free_pull_due = free_list.is_empty() || free_backlog >= threshold;
                    let read_flush_due = read_list.len() >= flush_half || (!read_list.is_empty() && last_flush.elapsed() >= STALE_TIMEOUT) || (desired_mode == SocketMode::NonBlocking && read_list.len() >= threshold);

                    if free_pull_due {
                        let returned = self.free_return.try_get();
                        free_list.extend(returned);
                    } else if read_flush_due {
                        self.q1.put(read_list.drain(..));
                        last_flush = Instant::now();
                    }
                }
                Err(e) => {
                    error!("receiver for port {} read error, stopping: {}", self.local_port, e);
                    free_list.push_front(buffer);
                    break;
                }
            }
        }

        if !read_list.is_empty() {
            self.q1.put(read_list.drain(..));
        }
        self.q1.put_one(Datagram::sentinel(self.local_port, self.buffer_capacity));
        info!("receiver for port {} stopped", self.local_port);
    }
}
