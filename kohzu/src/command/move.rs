use super::KohzuCommand;

/// Absolute positioning. Field order on the wire is speed, target pulses,
/// response timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveAbsolute {
    pub axis: u16,
    pub pulses: i32,
    pub speed: u8,
    pub timing: i32,
}

impl KohzuCommand for MoveAbsolute {
    const MNEMONIC: &'static str = "APS";

    fn axis(&self) -> u16 {
        self.axis
    }

    fn fields(&self) -> Vec<i32> {
        vec![i32::from(self.speed), self.pulses, self.timing]
    }
}

/// Relative positioning, same field layout as [`MoveAbsolute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRelative {
    pub axis: u16,
    pub pulses: i32,
    pub speed: u8,
    pub timing: i32,
}

impl KohzuCommand for MoveRelative {
    const MNEMONIC: &'static str = "RPS";

    fn axis(&self) -> u16 {
        self.axis
    }

    fn fields(&self) -> Vec<i32> {
        vec![i32::from(self.speed), self.pulses, self.timing]
    }
}

/// Origin return: drives the axis to its mechanical reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOrigin {
    pub axis: u16,
    pub speed: u8,
    pub timing: i32,
}

impl KohzuCommand for MoveOrigin {
    const MNEMONIC: &'static str = "ORG";

    fn axis(&self) -> u16 {
        self.axis
    }

    fn fields(&self) -> Vec<i32> {
        vec![i32::from(self.speed), self.timing]
    }
}
