use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::core::error::{Error, ErrorKind, Result};
use crate::net::frame::{self, Frame};

const SERVER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// How long one demux wait may block before the shutdown flag is observed.
const POLL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Reading,
    Processing,
    Writing,
    Closed,
}

/// Opaque handle workers use to address a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub usize);

struct Connection {
    socket: TcpStream,
    peer: SocketAddr,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
    written: usize,
    state: ConnState,
}

/// Handed to worker closures; queues response bytes and rings the waker so
/// the reactor thread copies them into the connection's write buffer.
#[derive(Clone)]
pub struct ResponseSender {
    pending: Arc<Mutex<Vec<(ConnectionId, Vec<u8>)>>>,
    waker: Arc<Waker>,
}

impl ResponseSender {
    pub fn send(&self, connection: ConnectionId, bytes: Vec<u8>) {
        self.pending.lock().push((connection, bytes));
        if let Err(e) = self.waker.wake() {
            warn!(error = %e, "reactor wakeup failed");
        }
    }
}

/// Called on the reactor thread for every decoded request frame. The
/// handler must not block longer than a pool enqueue.
pub type FrameHandler = Arc<dyn Fn(Frame, ConnectionId, ResponseSender) + Send + Sync>;

/// Single-threaded nonblocking event loop.
///
/// The reactor thread is the only thread touching the demux and the
/// per-connection buffers; workers communicate exclusively through
/// `ResponseSender`. A connection is registered for reads or writes, never
/// both at once: once a response is queued the socket switches to write
/// interest, and back to read interest when the buffer drains.
pub struct Reactor {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    pending: Arc<Mutex<Vec<(ConnectionId, Vec<u8>)>>>,
    waker: Arc<Waker>,
    shutdown: Arc<AtomicBool>,
}

impl Reactor {
    /// Bind the listening socket (address-reuse, nonblocking, backlog from
    /// the OS default which exceeds 128 on every target we run on).
    pub fn bind(ip: &str, port: u16, shutdown: Arc<AtomicBool>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", ip, port).parse().map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("invalid listen address {}:{}", ip, port),
            )
        })?;

        let listener = TcpListener::bind(addr).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot bind {}: {}", addr, e),
            )
        })?;

        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        info!(%addr, "listening");
        Ok(Reactor {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            pending: Arc::new(Mutex::new(Vec::new())),
            waker,
            shutdown,
        })
    }

    pub fn response_sender(&self) -> ResponseSender {
        ResponseSender {
            pending: self.pending.clone(),
            waker: self.waker.clone(),
        }
    }

    /// The bound address; useful when the configured port is 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run until the shutdown flag is raised. The demux wait times out
    /// every second so the flag is observed promptly.
    pub fn run(&mut self, handler: FrameHandler) -> Result<()> {
        self.poll
            .registry()
            .register(&mut self.listener, SERVER, Interest::READABLE)?;

        let mut events = Events::with_capacity(1024);
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            for event in events.iter() {
                match event.token() {
                    SERVER => self.accept_loop(),
                    WAKER => self.deliver_responses(),
                    token => {
                        if event.is_readable() {
                            self.handle_readable(token, &handler);
                        }
                        if event.is_writable() {
                            self.handle_writable(token);
                        }
                    }
                }
            }
        }

        info!("reactor stopping, closing {} connections", self.connections.len());
        let tokens: Vec<Token> = self.connections.keys().copied().collect();
        for token in tokens {
            self.close(token);
        }
        Ok(())
    }

    fn accept_loop(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut socket, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut socket, token, Interest::READABLE)
                    {
                        warn!(%peer, error = %e, "cannot register connection");
                        continue;
                    }

                    debug!(%peer, token = token.0, "connection accepted");
                    self.connections.insert(
                        token,
                        Connection {
                            socket,
                            peer,
                            read_buf: Vec::new(),
                            write_buf: Vec::new(),
                            written: 0,
                            state: ConnState::Reading,
                        },
                    );
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    /// Drain the socket (edge-triggered: until WouldBlock), then decode and
    /// dispatch every complete frame.
    fn handle_readable(&mut self, token: Token, handler: &FrameHandler) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let mut chunk = [0u8; 4096];
        loop {
            match conn.socket.read(&mut chunk) {
                Ok(0) => {
                    debug!(peer = %conn.peer, "peer closed");
                    self.close(token);
                    return;
                }
                Ok(n) => conn.read_buf.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(peer = %conn.peer, error = %e, "read failed");
                    self.close(token);
                    return;
                }
            }
        }

        let (frames, consumed) = frame::decode(&conn.read_buf);
        if consumed > 0 {
            conn.read_buf.drain(..consumed);
        }
        if frames.is_empty() {
            trace!(
                token = token.0,
                buffered = conn.read_buf.len(),
                needed = frame::required(&conn.read_buf),
                "partial frame"
            );
            return;
        }

        conn.state = ConnState::Processing;
        let sender = self.response_sender();
        for decoded in frames {
            // may block on a full task queue, back-pressuring this loop
            handler(decoded, ConnectionId(token.0), sender.clone());
        }
    }

    /// Copy worker-produced bytes into write buffers and switch those
    /// connections to write interest. Runs on the reactor thread, in FIFO
    /// order of wakeup delivery.
    fn deliver_responses(&mut self) {
        let batch: Vec<(ConnectionId, Vec<u8>)> = {
            let mut pending = self.pending.lock();
            std::mem::take(&mut *pending)
        };

        for (connection_id, bytes) in batch {
            let token = Token(connection_id.0);
            let Some(conn) = self.connections.get_mut(&token) else {
                debug!(token = token.0, "response for a closed connection dropped");
                continue;
            };

            conn.write_buf.extend_from_slice(&bytes);
            conn.state = ConnState::Writing;
            if let Err(e) =
                self.poll
                    .registry()
                    .reregister(&mut conn.socket, token, Interest::WRITABLE)
            {
                warn!(error = %e, "cannot arm connection for write");
                self.close(token);
                continue;
            }
            // flush what the socket will take right away
            self.handle_writable(token);
        }
    }

    /// Flush the write buffer; partial writes resume on the next writable
    /// event. An empty buffer re-arms the socket for reads.
    fn handle_writable(&mut self, token: Token) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        while conn.written < conn.write_buf.len() {
            match conn.socket.write(&conn.write_buf[conn.written..]) {
                Ok(n) => conn.written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(peer = %conn.peer, error = %e, "write failed");
                    self.close(token);
                    return;
                }
            }
        }

        conn.write_buf.clear();
        conn.written = 0;
        conn.state = ConnState::Reading;
        if let Err(e) = self
            .poll
            .registry()
            .reregister(&mut conn.socket, token, Interest::READABLE)
        {
            warn!(error = %e, "cannot re-arm connection for read");
            self.close(token);
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let last_state = conn.state;
            conn.state = ConnState::Closed;
            let _ = self.poll.registry().deregister(&mut conn.socket);
            debug!(peer = %conn.peer, token = token.0, from = ?last_state, "connection closed");
        }
    }
}
