//! Peer transport for the per-frame selection exchange.
//!
//! Both sides of a session call [`Transport::transfer`] exactly once per
//! frame: send the local [`SyncMessage`], then block until the peer's
//! message for the same frame arrives.  Messages are newline-delimited JSON.
//!
//! [`TcpTransport`] is the network implementation.  One side listens
//! ([`TcpTransport::serve_until`]), the other dials in
//! ([`TcpTransport::connect_until`]).  Both keep trying until the peer shows
//! up, their patience runs out or the caller cancels, since after a restart
//! the two sides rebuild their sessions at the same moment.
//!
//! Reads and writes carry a timeout so a silent peer surfaces as a
//! [`PlasteyError::Transport`] instead of freezing the frame loop.  A link
//! that is gone for good (closed, reset) surfaces as
//! [`PlasteyError::Disconnected`].
//!
//! [`ScriptedTransport`] answers from a queue and records what it was sent;
//! it stands in for the peer in tests and offline demos.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use plastey_types::{PlasteyError, SyncMessage};
use tracing::{debug, info, warn};

/// Default upper bound for one encoded message.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1 << 20;

/// Pause between attempts while waiting for the peer.
const RETRY_INTERVAL: Duration = Duration::from_millis(100);

pub trait Transport {
    /// Send `outgoing` and wait for the peer's message of the same frame.
    fn transfer(&mut self, outgoing: &SyncMessage) -> Result<SyncMessage, PlasteyError>;

    /// Release the connection.  Further transfers fail.
    fn close(&mut self);
}

// ────────────────────────────────────────────────────────────────────────────
// TCP
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TcpTransport {
    writer: Option<TcpStream>,
    reader: Option<BufReader<TcpStream>>,
    peer: SocketAddr,
    max_message_bytes: usize,
}

impl TcpTransport {
    /// Listen on `addr` and wait for the peer to connect.
    ///
    /// Gives up once `patience` has passed (zero waits indefinitely) or
    /// `cancel` is raised.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::Transport`] if binding or accepting fails,
    /// the wait runs out or it is cancelled.
    pub fn serve_until(
        addr: impl ToSocketAddrs,
        timeout: Duration,
        patience: Duration,
        cancel: &AtomicBool,
    ) -> Result<Self, PlasteyError> {
        let listener = TcpListener::bind(addr).map_err(transport_err("bind"))?;
        Self::accept_until(&listener, timeout, patience, cancel)
    }

    /// Accept one peer on an already bound listener, blocking until it
    /// arrives.
    pub fn accept(listener: &TcpListener, timeout: Duration) -> Result<Self, PlasteyError> {
        if let Ok(local) = listener.local_addr() {
            info!(%local, "waiting for peer");
        }
        let (stream, _) = listener.accept().map_err(transport_err("accept"))?;
        Self::from_stream(stream, timeout)
    }

    /// Accept one peer, polling the listener so the wait can be bounded.
    pub fn accept_until(
        listener: &TcpListener,
        timeout: Duration,
        patience: Duration,
        cancel: &AtomicBool,
    ) -> Result<Self, PlasteyError> {
        if let Ok(local) = listener.local_addr() {
            info!(%local, ?patience, "waiting for peer");
        }
        listener.set_nonblocking(true).map_err(transport_err("configure"))?;
        let started = Instant::now();
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms.
                    stream.set_nonblocking(false).map_err(transport_err("configure"))?;
                    return Self::from_stream(stream, timeout);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(transport_err("accept")(e)),
            }
            wait_for_retry("accept", started, patience, cancel)?;
        }
    }

    /// Dial the listening peer at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::Transport`] if the address does not resolve
    /// or no resolved address accepts the connection within `timeout`.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self, PlasteyError> {
        let addrs = addr.to_socket_addrs().map_err(transport_err("resolve"))?;
        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no address resolved");
        for candidate in addrs {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => return Self::from_stream(stream, timeout),
                Err(e) => {
                    debug!(%candidate, error = %e, "connect attempt failed");
                    last_error = e;
                }
            }
        }
        Err(transport_err("connect")(last_error))
    }

    /// Dial `addr` repeatedly until the peer accepts, `patience` has passed
    /// (zero retries indefinitely) or `cancel` is raised.
    ///
    /// # Errors
    ///
    /// Returns the last connect error once the wait runs out, or
    /// [`PlasteyError::Transport`] when cancelled.
    pub fn connect_until(
        addr: impl ToSocketAddrs,
        timeout: Duration,
        patience: Duration,
        cancel: &AtomicBool,
    ) -> Result<Self, PlasteyError> {
        let addrs: Vec<SocketAddr> = addr.to_socket_addrs().map_err(transport_err("resolve"))?.collect();
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match Self::connect(addrs.as_slice(), timeout) {
                Ok(transport) => return Ok(transport),
                Err(e) => {
                    debug!(attempts, error = %e, "peer not reachable yet");
                    if let Err(give_up) = wait_for_retry("connect", started, patience, cancel) {
                        warn!(attempts, error = %e, "giving up on the peer");
                        return Err(if cancel.load(Ordering::SeqCst) { give_up } else { e });
                    }
                }
            }
        }
    }

    pub fn from_stream(stream: TcpStream, timeout: Duration) -> Result<Self, PlasteyError> {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        stream.set_read_timeout(timeout).map_err(transport_err("configure"))?;
        stream.set_write_timeout(timeout).map_err(transport_err("configure"))?;
        stream.set_nodelay(true).map_err(transport_err("configure"))?;
        let peer = stream.peer_addr().map_err(transport_err("configure"))?;
        let reader = stream.try_clone().map_err(transport_err("configure"))?;
        info!(%peer, "peer connected");
        Ok(Self {
            writer: Some(stream),
            reader: Some(BufReader::new(reader)),
            peer,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        })
    }

    pub fn with_max_message_bytes(mut self, bytes: usize) -> Self {
        self.max_message_bytes = bytes.max(1);
        self
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn send(&mut self, message: &SyncMessage) -> Result<(), PlasteyError> {
        let writer = self.writer.as_mut().ok_or_else(closed)?;
        let mut line = serde_json::to_vec(message).map_err(|e| PlasteyError::Codec(e.to_string()))?;
        line.push(b'\n');
        writer.write_all(&line).map_err(transport_err("send"))?;
        writer.flush().map_err(transport_err("send"))
    }

    fn receive(&mut self) -> Result<SyncMessage, PlasteyError> {
        let limit = self.max_message_bytes;
        let reader = self.reader.as_mut().ok_or_else(closed)?;
        let mut line = String::new();
        let read = reader
            .by_ref()
            .take(limit as u64 + 1)
            .read_line(&mut line)
            .map_err(transport_err("receive"))?;
        if read == 0 {
            return Err(PlasteyError::Disconnected("peer closed the connection".to_string()));
        }
        if !line.ends_with('\n') && read > limit {
            return Err(PlasteyError::Codec(format!("message exceeds {limit} bytes")));
        }
        serde_json::from_str(line.trim_end()).map_err(|e| PlasteyError::Codec(e.to_string()))
    }
}

impl Transport for TcpTransport {
    fn transfer(&mut self, outgoing: &SyncMessage) -> Result<SyncMessage, PlasteyError> {
        self.send(outgoing)?;
        self.receive()
    }

    fn close(&mut self) {
        if let Some(stream) = self.writer.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            info!(peer = %self.peer, "peer connection closed");
        }
        self.reader = None;
    }
}

fn closed() -> PlasteyError {
    PlasteyError::Disconnected("connection already closed".to_string())
}

fn transport_err(stage: &'static str) -> impl Fn(io::Error) -> PlasteyError {
    move |e| match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            PlasteyError::Transport(format!("{stage} timed out"))
        }
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => PlasteyError::Disconnected(format!("{stage} failed: {e}")),
        _ => PlasteyError::Transport(format!("{stage} failed: {e}")),
    }
}

/// Sleep before the next attempt, or fail if the caller cancelled or the
/// patience window has closed.
fn wait_for_retry(
    stage: &'static str,
    started: Instant,
    patience: Duration,
    cancel: &AtomicBool,
) -> Result<(), PlasteyError> {
    if cancel.load(Ordering::SeqCst) {
        return Err(PlasteyError::Transport(format!("{stage} cancelled")));
    }
    if !patience.is_zero() && started.elapsed() >= patience {
        return Err(PlasteyError::Transport(format!("{stage} timed out after {patience:?}")));
    }
    thread::sleep(RETRY_INTERVAL);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<SyncMessage, String>>,
    sent: Vec<SyncMessage>,
    closed: bool,
}

/// In-process peer that replies from a queue.  Once the queue is empty it
/// replies with an empty selection.  Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, message: SyncMessage) -> &Self {
        self.script.borrow_mut().replies.push_back(Ok(message));
        self
    }

    /// Queue a failed exchange.
    pub fn fail(&self, reason: &str) -> &Self {
        self.script.borrow_mut().replies.push_back(Err(reason.to_string()));
        self
    }

    pub fn sent(&self) -> Vec<SyncMessage> {
        self.script.borrow().sent.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.script.borrow().closed
    }

    /// Drop the link from the peer's side.  Every later transfer fails with
    /// [`PlasteyError::Disconnected`].
    pub fn hang_up(&self) {
        self.script.borrow_mut().closed = true;
    }
}

impl Transport for ScriptedTransport {
    fn transfer(&mut self, outgoing: &SyncMessage) -> Result<SyncMessage, PlasteyError> {
        let mut script = self.script.borrow_mut();
        if script.closed {
            return Err(closed());
        }
        script.sent.push(outgoing.clone());
        match script.replies.pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(reason)) => Err(PlasteyError::Transport(reason)),
            None => Ok(SyncMessage::Selections(Vec::new())),
        }
    }

    fn close(&mut self) {
        self.script.borrow_mut().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_types::{Vec3, VertexUpdate};
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn tcp_peers_exchange_one_message_each() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");

        let client = thread::spawn(move || {
            let mut t = TcpTransport::connect(addr, TIMEOUT).expect("connect");
            let reply = t.transfer(&SyncMessage::Restart).expect("transfer");
            t.close();
            reply
        });

        let mut server = TcpTransport::accept(&listener, TIMEOUT).expect("accept");
        let ours = SyncMessage::Selections(vec![VertexUpdate::new(3, Vec3::new(1.0, 2.0, 3.0))]);
        let theirs = server.transfer(&ours).expect("transfer");

        assert_eq!(theirs, SyncMessage::Restart);
        assert_eq!(client.join().expect("client thread"), ours);
    }

    #[test]
    fn silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let _peer = TcpStream::connect(addr).expect("peer");

        let mut server = TcpTransport::accept(&listener, Duration::from_millis(50)).expect("accept");
        let err = server.transfer(&SyncMessage::Selections(Vec::new())).unwrap_err();
        assert!(matches!(err, PlasteyError::Transport(ref m) if m.contains("timed out")), "{err}");
    }

    #[test]
    fn closed_peer_is_reported_as_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let peer = TcpStream::connect(addr).expect("peer");

        let mut server = TcpTransport::accept(&listener, TIMEOUT).expect("accept");
        drop(peer);
        let err = server.transfer(&SyncMessage::Restart).unwrap_err();
        assert!(matches!(err, PlasteyError::Disconnected(_)), "{err}");
    }

    #[test]
    fn client_keeps_dialing_until_server_listens() {
        // Reserve a free port, then release it so the first attempts are refused.
        let addr = TcpListener::bind("127.0.0.1:0").expect("bind").local_addr().expect("addr");

        let server = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            let never = AtomicBool::new(false);
            let mut t = TcpTransport::serve_until(addr, TIMEOUT, TIMEOUT, &never).expect("serve");
            t.transfer(&SyncMessage::Restart).expect("transfer")
        });

        let never = AtomicBool::new(false);
        let mut client = TcpTransport::connect_until(addr, TIMEOUT, TIMEOUT, &never).expect("connect");
        let reply = client.transfer(&SyncMessage::Selections(Vec::new())).expect("transfer");

        assert_eq!(reply, SyncMessage::Restart);
        assert_eq!(server.join().expect("server thread"), SyncMessage::Selections(Vec::new()));
    }

    #[test]
    fn connect_gives_up_when_cancelled() {
        let addr = TcpListener::bind("127.0.0.1:0").expect("bind").local_addr().expect("addr");
        let cancel = AtomicBool::new(true);
        let err = TcpTransport::connect_until(addr, TIMEOUT, Duration::ZERO, &cancel).unwrap_err();
        assert!(matches!(err, PlasteyError::Transport(ref m) if m.contains("cancelled")), "{err}");
    }

    #[test]
    fn accept_gives_up_after_patience() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let never = AtomicBool::new(false);
        let started = Instant::now();
        let err = TcpTransport::accept_until(&listener, TIMEOUT, Duration::from_millis(200), &never).unwrap_err();
        assert!(matches!(err, PlasteyError::Transport(ref m) if m.contains("timed out")), "{err}");
        assert!(started.elapsed() < TIMEOUT);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let mut peer = TcpStream::connect(addr).expect("peer");
        peer.write_all(&[b'x'; 64]).expect("write");

        let mut server = TcpTransport::accept(&listener, TIMEOUT)
            .expect("accept")
            .with_max_message_bytes(16);
        let err = server.transfer(&SyncMessage::Restart).unwrap_err();
        assert!(matches!(err, PlasteyError::Codec(_)), "{err}");
    }

    #[test]
    fn close_rejects_further_transfers() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let _peer = TcpStream::connect(addr).expect("peer");
        let mut server = TcpTransport::accept(&listener, TIMEOUT).expect("accept");
        server.close();
        assert!(server.transfer(&SyncMessage::Restart).is_err());
    }

    #[test]
    fn scripted_transport_replays_queue_then_empty_selection() {
        let script = ScriptedTransport::new();
        script.reply(SyncMessage::Restart).fail("link down");
        let mut t = script.clone();

        assert_eq!(t.transfer(&SyncMessage::Selections(Vec::new())).unwrap(), SyncMessage::Restart);
        assert!(t.transfer(&SyncMessage::Selections(Vec::new())).is_err());
        assert_eq!(
            t.transfer(&SyncMessage::Selections(Vec::new())).unwrap(),
            SyncMessage::Selections(Vec::new())
        );
        assert_eq!(script.sent().len(), 3);

        t.close();
        assert!(script.is_closed());
        assert!(matches!(t.transfer(&SyncMessage::Restart), Err(PlasteyError::Disconnected(_))));
    }
}
