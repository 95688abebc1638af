pub mod commands;
pub mod service;

/// One parsed boundary request from a socket client.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Connect {
        host: String,
        port: u16,
    },
    Disconnect,
    MoveAbsolute {
        axis: u16,
        pulses: i32,
        speed: u8,
        timing: i32,
    },
    MoveRelative {
        axis: u16,
        pulses: i32,
        speed: u8,
        timing: i32,
    },
    /// Physical-unit move resolved against the motor catalog; validated
    /// against the motor's travel range before any pulses go on the wire.
    MoveMm {
        axis: u16,
        absolute: bool,
        target_mm: f64,
        motor: String,
        speed: u8,
    },
    MoveOrigin {
        axis: u16,
        speed: u8,
        timing: i32,
    },
    SetSystem {
        axis: u16,
        system_no: i32,
        value: i32,
    },
    MonitorAdd {
        axis: u16,
    },
    MonitorRemove {
        axis: u16,
    },
    MonitorStart {
        period_ms: Option<u64>,
    },
    MonitorStop,
    Position {
        axis: u16,
    },
}
