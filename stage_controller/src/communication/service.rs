use std::{os::unix::fs::PermissionsExt, path::Path, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use kohzu::Response;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::UnixListener,
};

use crate::{
    communication::{Request, commands::parse_request},
    config::Config,
    controller::engine::{ControllerEngine, EngineError},
    motors,
};

pub async fn run_communication_layer(
    engine: Arc<ControllerEngine>,
    config: Arc<Config>,
) -> Result<()> {
    let socket_path = config.socket.socket_path.clone();

    // Remove a stale socket file to prevent "Address already in use"
    if Path::new(&socket_path).exists() {
        std::fs::remove_file(&socket_path)
            .map_err(|e| anyhow!("Failed to remove existing socket file: {}", e))?;
    }

    let listener =
        UnixListener::bind(&socket_path).map_err(|e| anyhow!("Failed to bind to socket: {}", e))?;
    let permissions = std::fs::Permissions::from_mode(0o666);
    std::fs::set_permissions(&socket_path, permissions)
        .map_err(|e| anyhow!("Failed to set permissions: {}", e))?;

    tracing::info!("listening on {socket_path}");

    loop {
        let (mut socket, _) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("Failed to accept connection: {}", e))?;

        let engine = engine.clone();
        let config = config.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            loop {
                match socket.read(&mut buffer).await {
                    Ok(0) => break,
                    Ok(n) => {
                        let text = String::from_utf8_lossy(&buffer[..n]);

                        let reply = match parse_request(&text) {
                            Some(request) => handle_request(&engine, &config, request).await,
                            None => "Error: Invalid command format".to_string(),
                        };

                        if socket.write_all(format!("{reply}\n").as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("socket read error: {e}");
                        break;
                    }
                }
            }
        });
    }
}

async fn handle_request(engine: &ControllerEngine, config: &Config, request: Request) -> String {
    match request {
        Request::Connect { host, port } => match engine.connect(&host, port).await {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("Error: {e}"),
        },
        Request::Disconnect => {
            engine.disconnect().await;
            "OK".to_string()
        }
        Request::MoveAbsolute {
            axis,
            pulses,
            speed,
            timing,
        } => complete(engine.move_absolute(axis, pulses, speed, timing).await).await,
        Request::MoveRelative {
            axis,
            pulses,
            speed,
            timing,
        } => complete(engine.move_relative(axis, pulses, speed, timing).await).await,
        Request::MoveMm {
            axis,
            absolute,
            target_mm,
            motor,
            speed,
        } => handle_move_mm(engine, config, axis, absolute, target_mm, &motor, speed).await,
        Request::MoveOrigin { axis, speed, timing } => {
            complete(engine.move_origin(axis, speed, timing).await).await
        }
        Request::SetSystem {
            axis,
            system_no,
            value,
        } => complete(engine.set_system(axis, system_no, value).await).await,
        Request::MonitorAdd { axis } => ack(engine.add_axis_to_monitor(axis).await),
        Request::MonitorRemove { axis } => ack(engine.remove_axis_from_monitor(axis).await),
        Request::MonitorStart { period_ms } => {
            let period = period_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| engine.default_monitor_period());
            ack(engine.start_monitoring(period).await)
        }
        Request::MonitorStop => {
            engine.stop_monitoring().await;
            "OK".to_string()
        }
        Request::Position { axis } => match engine.get_position(axis).await {
            Some(pulses) => pulses.to_string(),
            None => "unknown".to_string(),
        },
    }
}

/// Converts a physical-unit request into pulses the way the operator tooling
/// always has: relative targets are resolved against the cached position
/// (zero when nothing is cached yet), and the target must stay within twice
/// the motor's travel range.
async fn handle_move_mm(
    engine: &ControllerEngine,
    config: &Config,
    axis: u16,
    absolute: bool,
    value_mm: f64,
    motor_name: &str,
    speed: u8,
) -> String {
    let Some(motor) = motors::find(&config.motors, motor_name) else {
        return format!("Error: unknown motor {motor_name}");
    };

    let target_mm = if absolute {
        value_mm
    } else {
        let current_pulses = engine.get_position(axis).await.unwrap_or(0);
        motor.pulses_to_mm(current_pulses) + value_mm
    };

    if !motor.in_range(target_mm) {
        return format!(
            "Error: target {target_mm} mm is out of range (0 ~ {} mm)",
            motor.travel_range_mm * 2.0
        );
    }

    let result = if absolute {
        engine
            .move_absolute(axis, motor.mm_to_pulses(target_mm), speed, 0)
            .await
    } else {
        engine
            .move_relative(axis, motor.mm_to_pulses(value_mm), speed, 0)
            .await
    };

    complete(result).await
}

async fn complete(
    result: Result<crate::controller::protocol::CommandHandle, EngineError>,
) -> String {
    match result {
        Ok(handle) => format_response(handle.response().await),
        Err(e) => format!("Error: {e}"),
    }
}

fn ack(result: Result<(), EngineError>) -> String {
    match result {
        Ok(()) => "OK".to_string(),
        Err(e) => format!("Error: {e}"),
    }
}

fn format_response(response: Response) -> String {
    if response.is_success() {
        response.raw().to_string()
    } else {
        format!("Error: {}", response.raw())
    }
}
