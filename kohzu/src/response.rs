use crate::command::STX;

/// Status reported by the controller when a command completed successfully.
/// Every other status is a failure; the failure taxonomy is controller-defined
/// and treated as opaque here.
pub const STATUS_COMPLETE: char = 'C';

const STATUS_ERROR: char = 'E';

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty response line")]
    Empty,

    #[error("status field {found:?} is not a single character")]
    BadStatus { found: String },
}

/// One decoded controller response line. Responses are tab-delimited: a
/// single-character status, the echoed command (mnemonic plus axis), then any
/// value fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: char,
    command: String,
    values: Vec<String>,
    raw: String,
}

impl Response {
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(line);
        let text = text
            .trim_end_matches(['\r', '\n'])
            .trim_start_matches(STX as char);

        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut parts = text.split('\t');

        let status_field = parts.next().unwrap_or_default();
        let mut chars = status_field.chars();
        let status = chars.next().ok_or(ParseError::Empty)?;
        if chars.next().is_some() {
            return Err(ParseError::BadStatus {
                found: status_field.to_string(),
            });
        }

        let command = parts.next().unwrap_or_default().to_string();
        let values = parts.map(str::to_string).collect();

        Ok(Response {
            status,
            command,
            values,
            raw: text.to_string(),
        })
    }

    /// A failure synthesized on this side of the link, for commands that can
    /// no longer receive a controller response (connection lost, reply
    /// unparseable).
    pub fn local_failure(reason: &str) -> Self {
        Response {
            status: STATUS_ERROR,
            command: String::new(),
            values: Vec::new(),
            raw: reason.to_string(),
        }
    }

    pub fn status(&self) -> char {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_COMPLETE
    }

    /// The echoed command, e.g. `APS1` or `RDP3`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// True for responses to system-parameter writes.
    pub fn is_system(&self) -> bool {
        use crate::command::{KohzuCommand as _, SetSystem};

        self.command.starts_with(SetSystem::MNEMONIC)
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn int_value(&self, index: usize) -> Option<i32> {
        self.value(index)?.trim().parse().ok()
    }

    /// The full response text with framing stripped.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion() {
        let response = Response::parse(b"C\tAPS1\r\n").unwrap();

        assert!(response.is_success());
        assert_eq!(response.status(), 'C');
        assert_eq!(response.command(), "APS1");
        assert_eq!(response.raw(), "C\tAPS1");
    }

    #[test]
    fn parses_error_with_code() {
        let response = Response::parse(b"E\tAPS1\t301\r\n").unwrap();

        assert!(!response.is_success());
        assert_eq!(response.status(), 'E');
        assert_eq!(response.value(0), Some("301"));
    }

    #[test]
    fn parses_position_value() {
        let response = Response::parse(b"C\tRDP2\t-1200\r\n").unwrap();

        assert!(response.is_success());
        assert_eq!(response.int_value(0), Some(-1200));
    }

    #[test]
    fn strips_stx_prefix() {
        let response = Response::parse(b"\x02C\tORG1\r\n").unwrap();

        assert!(response.is_success());
        assert_eq!(response.command(), "ORG1");
    }

    #[test]
    fn system_responses_are_recognizable() {
        let response = Response::parse(b"C\tWSY1\r\n").unwrap();

        assert!(response.is_system());
        assert!(!Response::parse(b"C\tAPS1\r\n").unwrap().is_system());
    }

    #[test]
    fn rejects_empty_line() {
        assert!(matches!(Response::parse(b"\r\n"), Err(ParseError::Empty)));
    }

    #[test]
    fn rejects_multi_character_status() {
        assert!(matches!(
            Response::parse(b"ERR\tAPS1\r\n"),
            Err(ParseError::BadStatus { .. })
        ));
    }

    #[test]
    fn local_failure_is_never_success() {
        let response = Response::local_failure("connection to the controller was lost");

        assert!(!response.is_success());
        assert_eq!(response.raw(), "connection to the controller was lost");
    }

    #[test]
    fn round_trip_success_and_failure() {
        use crate::command::{KohzuCommand, MoveAbsolute};

        let command = MoveAbsolute {
            axis: 1,
            pulses: 4000,
            speed: 2,
            timing: 0,
        };
        let _ = command.encode();

        // A controller that accepted the move echoes a completion; one that
        // rejected it echoes an error code. Both must map to the right
        // success flag.
        let accepted = Response::parse(b"C\tAPS1\r\n").unwrap();
        let rejected = Response::parse(b"E\tAPS1\t100\r\n").unwrap();

        assert!(accepted.is_success());
        assert!(!rejected.is_success());
    }
}
