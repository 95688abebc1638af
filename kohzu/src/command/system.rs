use super::KohzuCommand;

/// Writes one per-axis system parameter (e.g. homing direction). The meaning
/// of each system number is defined by the controller, not by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSystem {
    pub axis: u16,
    pub system_no: i32,
    pub value: i32,
}

impl KohzuCommand for SetSystem {
    const MNEMONIC: &'static str = "WSY";

    fn axis(&self) -> u16 {
        self.axis
    }

    fn fields(&self) -> Vec<i32> {
        vec![self.system_no, self.value]
    }
}
