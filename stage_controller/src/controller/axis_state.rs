use std::{collections::HashMap, sync::Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionEntry {
    pub pulses: i32,
    /// False until the first successful poll of this axis.
    pub valid: bool,
}

/// Last-known pulse positions per axis. Written by the monitor task, read
/// from any thread. Within one axis, writes land in query-completion order
/// because the monitor awaits each query before issuing the next.
#[derive(Debug, Default)]
pub struct AxisState {
    positions: Mutex<HashMap<u16, PositionEntry>>,
}

impl AxisState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an axis without a known position yet.
    pub fn ensure(&self, axis: u16) {
        self.positions
            .lock()
            .unwrap()
            .entry(axis)
            .or_insert(PositionEntry {
                pulses: 0,
                valid: false,
            });
    }

    pub fn set(&self, axis: u16, pulses: i32) {
        self.positions.lock().unwrap().insert(
            axis,
            PositionEntry {
                pulses,
                valid: true,
            },
        );
    }

    pub fn get(&self, axis: u16) -> Option<PositionEntry> {
        self.positions.lock().unwrap().get(&axis).copied()
    }

    pub fn clear(&self) {
        self.positions.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_axis_has_no_entry() {
        let state = AxisState::new();

        assert_eq!(state.get(7), None);
    }

    #[test]
    fn ensure_registers_an_invalid_entry() {
        let state = AxisState::new();
        state.ensure(1);

        let entry = state.get(1).unwrap();
        assert!(!entry.valid);
    }

    #[test]
    fn set_overwrites_and_validates() {
        let state = AxisState::new();
        state.ensure(1);
        state.set(1, 4000);
        state.set(1, 4100);

        assert_eq!(
            state.get(1),
            Some(PositionEntry {
                pulses: 4100,
                valid: true
            })
        );
    }

    #[test]
    fn ensure_never_downgrades_a_valid_entry() {
        let state = AxisState::new();
        state.set(2, -500);
        state.ensure(2);

        assert_eq!(
            state.get(2),
            Some(PositionEntry {
                pulses: -500,
                valid: true
            })
        );
    }

    #[test]
    fn clear_empties_the_cache() {
        let state = AxisState::new();
        state.set(1, 100);
        state.set(2, 200);
        state.clear();

        assert_eq!(state.get(1), None);
        assert_eq!(state.get(2), None);
    }
}
