use super::KohzuCommand;

/// Reads the current pulse position of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPosition {
    pub axis: u16,
}

impl KohzuCommand for ReadPosition {
    const MNEMONIC: &'static str = "RDP";

    fn axis(&self) -> u16 {
        self.axis
    }

    fn fields(&self) -> Vec<i32> {
        Vec::new()
    }
}
