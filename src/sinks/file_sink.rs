//! File sink implementation
//!
//! Owns every file handle of one engine/receiver session: the global
//! `full.log`/`warning.log` pair plus a lazily created pair per distinct
//! scope. Exactly one consumer thread ever touches a sink, so no locking
//! is needed around file I/O.

use crate::core::{LogRecord, WARNING_THRESHOLD};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One append-mode log file. A handle that fails to open or write is marked
/// broken and skipped from then on; log loss must never crash the host.
enum SinkHandle {
    Open(File),
    Broken,
}

impl SinkHandle {
    fn open(path: &Path) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => SinkHandle::Open(file),
            Err(e) => {
                eprintln!("[RELAY ERROR] cannot open '{}': {}", path.display(), e);
                SinkHandle::Broken
            }
        }
    }

    /// Write the record line, then the exception block if present. Every
    /// write is flushed immediately; there is no extra buffering layer.
    fn write_record(&mut self, path: &Path, record: &LogRecord) {
        let SinkHandle::Open(file) = self else {
            return;
        };
        let result = (|| {
            file.write_all(record.rendered_line.as_bytes())?;
            file.write_all(b"\n")?;
            if let Some(ref text) = record.exception_text {
                file.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    file.write_all(b"\n")?;
                }
            }
            file.flush()
        })();
        if let Err(e) = result {
            eprintln!("[RELAY ERROR] write to '{}' failed: {}", path.display(), e);
            *self = SinkHandle::Broken;
        }
    }

    fn flush(&mut self, path: &Path) {
        if let SinkHandle::Open(file) = self {
            if let Err(e) = file.flush() {
                eprintln!("[RELAY ERROR] flush of '{}' failed: {}", path.display(), e);
            }
        }
    }
}

struct HandlePair {
    full_path: PathBuf,
    warning_path: PathBuf,
    full: SinkHandle,
    warning: SinkHandle,
}

impl HandlePair {
    fn open(dir: &Path, prefix: &str) -> Self {
        let full_path = dir.join(format!("{}full.log", prefix));
        let warning_path = dir.join(format!("{}warning.log", prefix));
        let full = SinkHandle::open(&full_path);
        let warning = SinkHandle::open(&warning_path);
        Self {
            full_path,
            warning_path,
            full,
            warning,
        }
    }

    fn write(&mut self, record: &LogRecord) {
        self.full.write_record(&self.full_path, record);
        if record.level >= WARNING_THRESHOLD {
            self.warning.write_record(&self.warning_path, record);
        }
    }

    fn flush(&mut self) {
        self.full.flush(&self.full_path);
        self.warning.flush(&self.warning_path);
    }
}

/// Persists records into the session directory.
pub struct FileSink {
    session_dir: PathBuf,
    global: HandlePair,
    scoped: HashMap<String, HandlePair>,
}

impl FileSink {
    /// Open the global handle pair in `session_dir`. The directory must
    /// already exist (the lifecycle manager creates it during init); an
    /// unopenable handle is diagnosed and skipped, never an error.
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        let session_dir = session_dir.into();
        let global = HandlePair::open(&session_dir, "");
        Self {
            session_dir,
            global,
            scoped: HashMap::new(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// Number of per-scope handle pairs opened so far.
    pub fn scoped_pair_count(&self) -> usize {
        self.scoped.len()
    }

    /// Route one record to the global pair and, for a non-empty scope, to
    /// that scope's lazily created pair.
    pub fn write(&mut self, record: &LogRecord) {
        self.global.write(record);
        if !record.scope.is_empty() {
            let pair = self
                .scoped
                .entry(record.scope.clone())
                .or_insert_with(|| {
                    HandlePair::open(&self.session_dir, &format!("{}_", record.scope))
                });
            pair.write(record);
        }
    }

    pub fn flush_all(&mut self) {
        self.global.flush();
        for pair in self.scoped.values_mut() {
            pair.flush();
        }
    }

    /// Flush and close every handle, tolerating per-handle failures
    /// independently. The sink is unusable afterwards.
    pub fn close(&mut self) {
        self.flush_all();
        self.global.full = SinkHandle::Broken;
        self.global.warning = SinkHandle::Broken;
        self.scoped.clear();
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure buffered data reaches disk even on an unclean exit path
        self.flush_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LogRecord};
    use std::fs;
    use tempfile::TempDir;

    fn record(line: &str, level: LogLevel, scope: &str) -> LogRecord {
        LogRecord::new(line, level, scope)
    }

    #[test]
    fn test_global_pair_created_eagerly() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let _sink = FileSink::new(dir.path());
        assert!(dir.path().join("full.log").exists());
        assert!(dir.path().join("warning.log").exists());
    }

    #[test]
    fn test_severity_routing() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());

        sink.write(&record("info line", LogLevel::Info, "net"));
        sink.write(&record("warn line", LogLevel::Warn, "net"));
        sink.close();

        let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
        let warning = fs::read_to_string(dir.path().join("warning.log")).unwrap();
        let scoped_full = fs::read_to_string(dir.path().join("net_full.log")).unwrap();
        let scoped_warning = fs::read_to_string(dir.path().join("net_warning.log")).unwrap();

        assert!(full.contains("info line") && full.contains("warn line"));
        assert!(!warning.contains("info line") && warning.contains("warn line"));
        assert!(scoped_full.contains("info line") && scoped_full.contains("warn line"));
        assert!(!scoped_warning.contains("info line") && scoped_warning.contains("warn line"));
    }

    #[test]
    fn test_lazy_single_pair_per_scope() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());

        for i in 0..20 {
            sink.write(&record(&format!("line {}", i), LogLevel::Info, "db"));
        }
        assert_eq!(sink.scoped_pair_count(), 1);

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 4, "expected exactly 4 files, got {:?}", names);
    }

    #[test]
    fn test_empty_scope_routes_global_only() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());
        sink.write(&record("unscoped", LogLevel::Warn, ""));
        sink.close();

        assert_eq!(sink.scoped_pair_count(), 0);
        let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert!(full.contains("unscoped"));
    }

    #[test]
    fn test_exception_block_follows_line() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());
        sink.write(
            &record("boom", LogLevel::Error, "").with_exception("trace line 1\ntrace line 2"),
        );
        sink.close();

        let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert_eq!(full, "boom\ntrace line 1\ntrace line 2\n");
        let warning = fs::read_to_string(dir.path().join("warning.log")).unwrap();
        assert_eq!(warning, full, "exception routes under the same severity");
    }

    #[test]
    fn test_line_is_verbatim_plus_newline() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());
        sink.write(&record("[10:32:01] INFO exact bytes", LogLevel::Info, ""));
        sink.close();

        let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert_eq!(full, "[10:32:01] INFO exact bytes\n");
    }

    #[test]
    fn test_close_tolerates_reuse() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::new(dir.path());
        sink.write(&record("before", LogLevel::Info, ""));
        sink.close();
        // A write after close is skipped, not a panic or error.
        sink.write(&record("after", LogLevel::Info, ""));

        let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert!(full.contains("before"));
        assert!(!full.contains("after"));
    }
}
