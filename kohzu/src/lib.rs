pub mod command;
pub mod response;

pub use command::{
    KohzuCommand, MoveAbsolute, MoveOrigin, MoveRelative, ReadPosition, SetSystem,
};
pub use response::{ParseError, Response, STATUS_COMPLETE};
