use std::{
    collections::VecDeque,
    io,
    net::ToSocketAddrs,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use kohzu::{KohzuCommand, Response};
use tokio::sync::{broadcast, oneshot};
use utilities::line_transport::{LineTransport, TransportEvent};

use crate::controller::EngineEvent;

const LOST_CONNECTION: &str = "connection to the controller was lost";

type PendingQueue = Arc<Mutex<VecDeque<oneshot::Sender<Response>>>>;

/// Resolves exactly once: with the correlated controller response, or with a
/// failure synthesized locally if the connection went away first.
pub struct CommandHandle {
    receiver: oneshot::Receiver<Response>,
}

impl CommandHandle {
    pub async fn response(self) -> Response {
        match self.receiver.await {
            Ok(response) => response,
            Err(_) => Response::local_failure(LOST_CONNECTION),
        }
    }
}

/// One live connection to the controller: the transport plus correlation of
/// responses to outstanding commands.
///
/// The controller processes commands one at a time in arrival order and its
/// protocol carries no sequence numbers, so correlation is FIFO: the N-th
/// response on the wire completes the N-th outstanding command. Should a
/// controller revision ever reorder responses, this matching would silently
/// mispair them; the integration suite pins the assumption down.
pub struct ProtocolSession {
    transport: Mutex<LineTransport>,
    pending: PendingQueue,
    alive: Arc<AtomicBool>,
}

impl ProtocolSession {
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        events: broadcast::Sender<EngineEvent>,
    ) -> io::Result<Self> {
        let pending: PendingQueue = Arc::new(Mutex::new(VecDeque::new()));
        let alive = Arc::new(AtomicBool::new(true));

        let transport = {
            let pending = pending.clone();
            let alive = alive.clone();

            LineTransport::connect(addr, move |event| match event {
                TransportEvent::Frame(line) => complete_next(&pending, &events, &line),
                TransportEvent::Closed => {
                    alive.store(false, Ordering::SeqCst);
                    fail_outstanding(&pending);
                    let _ = events.send(EngineEvent::ConnectionStatus(false));
                    let _ = events.send(EngineEvent::Log(LOST_CONNECTION.to_string()));
                }
            })?
        };

        Ok(ProtocolSession {
            transport: Mutex::new(transport),
            pending,
            alive,
        })
    }

    /// Encodes and enqueues the command without waiting for I/O. If the
    /// connection is already gone the handle resolves immediately with a
    /// synthesized failure.
    pub fn send_command<C: KohzuCommand>(&self, command: &C) -> CommandHandle {
        let (tx, rx) = oneshot::channel();
        let frame = command.encode();

        // The pending entry must be queued before a response can arrive;
        // holding the lock across the enqueue keeps the reader from popping
        // out of order. Lock order is transport, then pending, everywhere.
        let transport = self.transport.lock().unwrap();
        let mut pending = self.pending.lock().unwrap();

        match transport.send(frame) {
            Ok(()) => pending.push_back(tx),
            Err(_) => {
                let _ = tx.send(Response::local_failure(LOST_CONNECTION));
            }
        }

        CommandHandle { receiver: rx }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Stops the transport, joins its worker thread, then fails whatever is
    /// still outstanding. After this returns no completion can fire again.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.transport.lock().unwrap().close();
        fail_outstanding(&self.pending);
    }
}

fn complete_next(pending: &PendingQueue, events: &broadcast::Sender<EngineEvent>, line: &[u8]) {
    let sender = pending.lock().unwrap().pop_front();

    let response = match Response::parse(line) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("unparseable controller response: {e}");
            Response::local_failure("unparseable controller response")
        }
    };

    let _ = events.send(EngineEvent::Log(format!(
        "controller response: {}",
        response.raw()
    )));

    match sender {
        Some(sender) => {
            let _ = sender.send(response);
        }
        None => tracing::warn!("response with no outstanding command: {}", response.raw()),
    }
}

fn fail_outstanding(pending: &PendingQueue) {
    let drained: Vec<_> = pending.lock().unwrap().drain(..).collect();

    for sender in drained {
        let _ = sender.send(Response::local_failure(LOST_CONNECTION));
    }
}
