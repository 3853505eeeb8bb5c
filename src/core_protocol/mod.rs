// Wire primitives shared by the server and the client driver.

pub mod code;
pub mod connection;
pub mod error;
pub mod parser;
pub mod resume;

pub use code::ControlCode;
pub use connection::Connection;
pub use error::ProtocolError;
pub use parser::Parser;
pub use resume::ResumeInfo;
