pub mod command;
pub mod file;
pub mod logging;
pub mod system;
