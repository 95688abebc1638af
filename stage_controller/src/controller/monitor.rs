use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use kohzu::ReadPosition;
use tokio::{sync::broadcast, time::MissedTickBehavior};

use crate::controller::{EngineEvent, axis_state::AxisState, protocol::ProtocolSession};

pub(crate) struct MonitorContext {
    pub period: Duration,
    pub protocol: Arc<ProtocolSession>,
    pub monitored: Arc<Mutex<BTreeSet<u16>>>,
    pub positions: Arc<AxisState>,
    pub active: Arc<AtomicBool>,
    pub events: broadcast::Sender<EngineEvent>,
}

/// Each tick queries every monitored axis in increasing order, waiting for
/// each answer before issuing the next. The interval defers a tick that
/// would overlap a slow one, so per-axis writes stay ordered and a tick is
/// never in flight twice.
pub(crate) async fn run_position_monitor(ctx: MonitorContext) {
    let mut interval = tokio::time::interval(ctx.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while ctx.active.load(Ordering::SeqCst) {
        interval.tick().await;

        if !ctx.protocol.is_alive() {
            tracing::warn!("position monitor stopping: connection is gone");
            return;
        }

        let axes: Vec<u16> = ctx.monitored.lock().unwrap().iter().copied().collect();

        for axis in axes {
            let response = ctx.protocol.send_command(&ReadPosition { axis }).response().await;

            if !ctx.active.load(Ordering::SeqCst) {
                // Stopped mid-tick: the result is discarded, not cached.
                return;
            }

            if !response.is_success() {
                // Keep the previous entry; stale beats flapping to unknown.
                tracing::debug!(axis, "position poll failed: {}", response.raw());
                continue;
            }

            match response.int_value(0) {
                Some(pulses) => {
                    ctx.positions.set(axis, pulses);
                    let _ = ctx
                        .events
                        .send(EngineEvent::PositionUpdated { axis, pulses });
                }
                None => {
                    tracing::debug!(axis, "position poll returned no value: {}", response.raw())
                }
            }
        }
    }
}
