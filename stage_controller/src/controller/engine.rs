use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use kohzu::{MoveAbsolute, MoveOrigin, MoveRelative, SetSystem};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    config::EngineConfig,
    controller::{
        EngineEvent,
        axis_state::AxisState,
        monitor::{self, MonitorContext},
        protocol::{CommandHandle, ProtocolSession},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("not connected to the controller")]
    NotConnected,

    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        source: std::io::Error,
    },
}

struct MonitorHandle {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Everything that lives exactly as long as one connection.
struct Session {
    protocol: Arc<ProtocolSession>,
    positions: Arc<AxisState>,
    monitored: Arc<StdMutex<BTreeSet<u16>>>,
    monitor: Option<MonitorHandle>,
}

/// The controller facade: command issuance, the monitored-axis set, the
/// monitor-loop lifecycle, and connect/disconnect teardown. Shared behind an
/// `Arc`; every method takes `&self`.
pub struct ControllerEngine {
    config: EngineConfig,
    session: tokio::sync::Mutex<Option<Session>>,
    events: broadcast::Sender<EngineEvent>,
}

impl ControllerEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(256);

        Self {
            config,
            session: tokio::sync::Mutex::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn default_monitor_period(&self) -> Duration {
        Duration::from_millis(self.config.default_monitor_period_ms)
    }

    /// Tears down any previous session, then establishes a fresh one. On
    /// failure the engine is left disconnected; nothing retries.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), EngineError> {
        let mut session = self.session.lock().await;
        if let Some(old) = session.take() {
            teardown(old).await;
        }

        let addr = format!("{host}:{port}");

        // Establishing the transport blocks until the connection attempt
        // resolves; keep that off the shared runtime.
        let connect_result = {
            let addr = addr.clone();
            let events = self.events.clone();
            tokio::task::spawn_blocking(move || ProtocolSession::connect(addr.as_str(), events))
                .await
                .unwrap_or_else(|_| Err(std::io::Error::other("connect task failed")))
        };

        let protocol = match connect_result {
            Ok(protocol) => protocol,
            Err(source) => {
                let _ = self.events.send(EngineEvent::ConnectionStatus(false));
                let _ = self
                    .events
                    .send(EngineEvent::Log(format!("connection to {addr} failed: {source}")));
                return Err(EngineError::Connection { addr, source });
            }
        };

        *session = Some(Session {
            protocol: Arc::new(protocol),
            positions: Arc::new(AxisState::new()),
            monitored: Arc::new(StdMutex::new(BTreeSet::new())),
            monitor: None,
        });

        tracing::info!("connected to controller at {addr}");
        let _ = self.events.send(EngineEvent::ConnectionStatus(true));
        let _ = self.events.send(EngineEvent::Log(format!("connected to {addr}")));

        Ok(())
    }

    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;

        if let Some(old) = session.take() {
            teardown(old).await;
            tracing::info!("disconnected from controller");
            let _ = self.events.send(EngineEvent::ConnectionStatus(false));
            let _ = self.events.send(EngineEvent::Log("disconnected".to_string()));
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| session.protocol.is_alive())
    }

    pub async fn move_absolute(
        &self,
        axis: u16,
        pulses: i32,
        speed: u8,
        timing: i32,
    ) -> Result<CommandHandle, EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        self.auto_monitor(session, axis);

        Ok(session.protocol.send_command(&MoveAbsolute {
            axis,
            pulses,
            speed,
            timing,
        }))
    }

    pub async fn move_relative(
        &self,
        axis: u16,
        pulses: i32,
        speed: u8,
        timing: i32,
    ) -> Result<CommandHandle, EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        self.auto_monitor(session, axis);

        Ok(session.protocol.send_command(&MoveRelative {
            axis,
            pulses,
            speed,
            timing,
        }))
    }

    pub async fn move_origin(
        &self,
        axis: u16,
        speed: u8,
        timing: i32,
    ) -> Result<CommandHandle, EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        self.auto_monitor(session, axis);

        Ok(session
            .protocol
            .send_command(&MoveOrigin { axis, speed, timing }))
    }

    pub async fn set_system(
        &self,
        axis: u16,
        system_no: i32,
        value: i32,
    ) -> Result<CommandHandle, EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        Ok(session.protocol.send_command(&SetSystem {
            axis,
            system_no,
            value,
        }))
    }

    /// Idempotent: adding a present axis is a no-op.
    pub async fn add_axis_to_monitor(&self, axis: u16) -> Result<(), EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        session.monitored.lock().unwrap().insert(axis);
        session.positions.ensure(axis);

        Ok(())
    }

    /// Idempotent: removing an absent axis is a no-op.
    pub async fn remove_axis_from_monitor(&self, axis: u16) -> Result<(), EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        session.monitored.lock().unwrap().remove(&axis);

        Ok(())
    }

    pub async fn monitored_axes(&self) -> Result<Vec<u16>, EngineError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(EngineError::NotConnected)?;

        Ok(session.monitored.lock().unwrap().iter().copied().collect())
    }

    /// Starts (or restarts) the polling loop at the given period.
    pub async fn start_monitoring(&self, period: Duration) -> Result<(), EngineError> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(EngineError::NotConnected)?;

        if let Some(previous) = session.monitor.take() {
            stop_monitor(previous).await;
        }

        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(monitor::run_position_monitor(MonitorContext {
            period,
            protocol: session.protocol.clone(),
            monitored: session.monitored.clone(),
            positions: session.positions.clone(),
            active: active.clone(),
            events: self.events.clone(),
        }));

        session.monitor = Some(MonitorHandle { active, task });
        tracing::info!("position monitoring started, period {period:?}");

        Ok(())
    }

    /// Halts the polling loop. Once this returns, results of queries that
    /// were in flight are discarded rather than cached.
    pub async fn stop_monitoring(&self) {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_mut() {
            if let Some(monitor) = session.monitor.take() {
                stop_monitor(monitor).await;
                tracing::info!("position monitoring stopped");
            }
        }
    }

    /// None until the first successful poll of the axis.
    pub async fn get_position(&self, axis: u16) -> Option<i32> {
        let guard = self.session.lock().await;
        let session = guard.as_ref()?;

        session
            .positions
            .get(axis)
            .filter(|entry| entry.valid)
            .map(|entry| entry.pulses)
    }

    fn auto_monitor(&self, session: &Session, axis: u16) {
        if self.config.auto_monitor_on_move {
            session.monitored.lock().unwrap().insert(axis);
            session.positions.ensure(axis);
        }
    }
}

async fn stop_monitor(monitor: MonitorHandle) {
    monitor.active.store(false, Ordering::SeqCst);
    monitor.task.abort();
    let _ = monitor.task.await;
}

/// Teardown order matters: stop the monitor before the transport goes away,
/// and join the I/O worker before failing what is still outstanding, so no
/// completion can fire twice and no thread outlives the session it belongs
/// to.
async fn teardown(mut session: Session) {
    if let Some(monitor) = session.monitor.take() {
        stop_monitor(monitor).await;
    }

    // close() joins the I/O worker thread; run it where blocking is allowed.
    let protocol = session.protocol.clone();
    let _ = tokio::task::spawn_blocking(move || protocol.close()).await;

    session.positions.clear();
    session.monitored.lock().unwrap().clear();
}
