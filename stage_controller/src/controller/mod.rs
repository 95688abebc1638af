pub mod axis_state;
pub mod engine;
pub mod monitor;
pub mod protocol;

/// Events pushed to boundary-layer subscribers: connection state changes,
/// cached-position updates from the monitor loop, and free-text log lines.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    ConnectionStatus(bool),
    PositionUpdated { axis: u16, pulses: i32 },
    Log(String),
}
