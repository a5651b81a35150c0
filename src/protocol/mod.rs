// frames are sent as "<length>\n<payload>"
pub const MAX_FRAME_LEN: usize = 64 * 1024;
const MAX_HEADER_LEN: usize = 20;

pub const FIELD_SEPARATOR: char = '|';
pub const EXIT_KEYWORD: &str = "exit";

pub mod connection;
pub mod message;

pub use connection::{Connection, ConnectionErr};
pub use message::{Request, RequestErr, Response};
