// Here's the list of the commands the session dispatches

pub mod command;

pub mod download;
pub mod echo;
pub mod help;
pub mod logout;
pub mod mkdir;
pub mod rm;
pub mod shutdown;
pub mod stime;
pub mod time;
pub mod tree;
pub mod udpdownload;
pub mod udpupload;
pub mod upload;
