pub mod r#move;
pub mod read;
pub mod system;

pub use r#move::{MoveAbsolute, MoveOrigin, MoveRelative};
pub use read::ReadPosition;
pub use system::SetSystem;

/// Start-of-text byte opening every command line.
pub const STX: u8 = 0x02;

/// One ARIES command: a three-letter mnemonic, the target axis, and
/// slash-separated numeric fields, STX-prefixed and CRLF-terminated.
pub trait KohzuCommand {
    const MNEMONIC: &'static str;

    fn axis(&self) -> u16;
    fn fields(&self) -> Vec<i32>;

    fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(24);
        buffer.push(STX);
        buffer.extend_from_slice(Self::MNEMONIC.as_bytes());
        buffer.extend_from_slice(self.axis().to_string().as_bytes());
        for field in self.fields() {
            buffer.push(b'/');
            buffer.extend_from_slice(field.to_string().as_bytes());
        }
        buffer.extend_from_slice(b"\r\n");
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_move_absolute() {
        let command = MoveAbsolute {
            axis: 1,
            pulses: 4000,
            speed: 2,
            timing: 0,
        };

        assert_eq!(command.encode(), b"\x02APS1/2/4000/0\r\n");
    }

    #[test]
    fn encode_move_relative_negative_pulses() {
        let command = MoveRelative {
            axis: 3,
            pulses: -1500,
            speed: 0,
            timing: 0,
        };

        assert_eq!(command.encode(), b"\x02RPS3/0/-1500/0\r\n");
    }

    #[test]
    fn encode_move_origin() {
        let command = MoveOrigin {
            axis: 2,
            speed: 5,
            timing: 0,
        };

        assert_eq!(command.encode(), b"\x02ORG2/5/0\r\n");
    }

    #[test]
    fn encode_set_system() {
        let command = SetSystem {
            axis: 4,
            system_no: 2,
            value: 8,
        };

        assert_eq!(command.encode(), b"\x02WSY4/2/8\r\n");
    }

    #[test]
    fn encode_read_position() {
        let command = ReadPosition { axis: 12 };

        assert_eq!(command.encode(), b"\x02RDP12\r\n");
    }
}
