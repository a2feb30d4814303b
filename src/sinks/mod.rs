//! Sink implementations

pub mod console;
pub mod file_sink;

pub use console::ConsoleSink;
pub use file_sink::FileSink;
