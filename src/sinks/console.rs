//! Console sink implementation
//!
//! The console path is synchronous: it runs on the caller's thread, after
//! the dispatcher has already decided the record clears the console
//! threshold. Error and Fatal go to stderr, everything else to stdout.

use crate::core::LogLevel;

#[cfg(feature = "console")]
use colored::Colorize;

#[derive(Debug, Clone)]
pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Echo one pre-rendered line (and exception block, if any).
    pub fn echo(&self, level: LogLevel, line: &str, exception_text: Option<&str>) {
        let painted = self.paint(level, line);
        match level {
            LogLevel::Error | LogLevel::Fatal => {
                eprintln!("{}", painted);
                if let Some(text) = exception_text {
                    eprint!("{}", Self::terminated(text));
                }
            }
            _ => {
                println!("{}", painted);
                if let Some(text) = exception_text {
                    print!("{}", Self::terminated(text));
                }
            }
        }
    }

    #[cfg(feature = "console")]
    fn paint(&self, level: LogLevel, line: &str) -> String {
        if self.use_colors {
            line.color(level.color_code()).to_string()
        } else {
            line.to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn paint(&self, _level: LogLevel, line: &str) -> String {
        line.to_string()
    }

    fn terminated(text: &str) -> String {
        if text.ends_with('\n') {
            text.to_string()
        } else {
            format!("{}\n", text)
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}
