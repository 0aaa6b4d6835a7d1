//! Line-protocol codec: outbound command formatting and inbound line parsing.

pub mod command;
pub mod response;

pub use command::MatrixCommand;
pub use response::{parse_line, ResponseLine};
