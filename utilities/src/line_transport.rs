use std::{
    io,
    net::{SocketAddr, ToSocketAddrs},
    thread::JoinHandle,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::{mpsc, oneshot},
};

/// Delivered to the registered handler from the I/O thread.
#[derive(Debug)]
pub enum TransportEvent {
    /// One complete newline-terminated inbound frame, delimiter included.
    Frame(Vec<u8>),
    /// The peer closed the stream or it failed; no further frames follow.
    /// Not delivered on an explicit [`LineTransport::close`].
    Closed,
}

/// One duplex line-oriented TCP connection. All I/O runs on a current-thread
/// tokio runtime owned by a dedicated worker thread; callers enqueue writes
/// without blocking and receive inbound frames through the handler, which is
/// invoked on the worker thread and must not block.
pub struct LineTransport {
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl LineTransport {
    /// Connects and spawns the I/O worker. Returns only once the connection
    /// attempt has resolved, so a returned transport is live.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        handler: impl FnMut(TransportEvent) + Send + 'static,
    ) -> io::Result<Self> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no address resolved")
        })?;

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let worker = std::thread::Builder::new()
            .name("line-transport".to_string())
            .spawn(move || run_io(addr, outgoing_rx, shutdown_rx, ready_tx, handler))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(LineTransport {
                outgoing,
                shutdown: Some(shutdown),
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(io::Error::other("transport worker died during connect"))
            }
        }
    }

    /// Enqueues one outgoing frame. Fails once the connection is gone.
    pub fn send(&self, frame: Vec<u8>) -> io::Result<()> {
        self.outgoing
            .send(frame)
            .map_err(|_| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))
    }

    /// Stops the I/O runtime and joins the worker thread before returning,
    /// so a new transport generation can never interleave with this one.
    /// Idempotent.
    pub fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for LineTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_io(
    addr: SocketAddr,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown: oneshot::Receiver<()>,
    ready: std::sync::mpsc::Sender<io::Result<()>>,
    mut handler: impl FnMut(TransportEvent) + Send + 'static,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    runtime.block_on(async move {
        let stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        let (read_half, mut write_half) = stream.into_split();

        let writer = tokio::spawn(async move {
            while let Some(frame) = outgoing.recv().await {
                if write_half.write_all(&frame).await.is_err() {
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(read_half);
            let mut line = Vec::new();

            loop {
                line.clear();
                match lines.read_until(b'\n', &mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => handler(TransportEvent::Frame(line.clone())),
                }
            }

            handler(TransportEvent::Closed);
        });

        tokio::select! {
            _ = shutdown => {}
            _ = reader => {}
        }

        writer.abort();
        // Dropping the runtime cancels whichever task is still running; a
        // handler invocation in progress finishes before the drop completes.
    });
}
