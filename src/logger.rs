//! Logging for the block pipeline and simulator.
//!
//! Diagnostics in this crate are log lines aimed at a developer/educator
//! audience: skipped chunks, unresolved calls, unmapped pins. They are never
//! fatal, so the logger is the one place they all flow through. A global
//! instance is used so that deeply nested pipeline code can emit a line
//! without threading a handle through every call.

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

/// Global logger instance
static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Log file configuration
const LOG_FILE_MAX_SIZE: u64 = 1024 * 1024; // 1MB
const LOG_FILE_MAX_COUNT: usize = 5;
const LOG_FILE_NAME: &str = "trundle.log";

/// Represents the severity level of a log message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// A significant error that affects functionality but may allow continuation.
    Error,
    /// A potential issue or unexpected situation (skipped chunk, unmapped pin).
    Warn,
    /// Informational messages about the pipeline's progress.
    Info,
    /// Detailed messages useful for debugging.
    Debug,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "[ERROR]"),
            Severity::Warn => write!(f, "[WARN]"),
            Severity::Info => write!(f, "[INFO]"),
            Severity::Debug => write!(f, "[DEBUG]"),
        }
    }
}

/// A structured log message: a severity level and the message text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: Severity,
    pub msg: String,
}

impl LogMessage {
    pub fn new(level: Severity, msg: String) -> Self {
        LogMessage { level, msg }
    }

    pub fn error(msg: String) -> Self {
        LogMessage::new(Severity::Error, msg)
    }

    pub fn warn(msg: String) -> Self {
        LogMessage::new(Severity::Warn, msg)
    }
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level, self.msg)
    }
}

/// File-based log writer with rotation
#[derive(Debug)]
pub struct LogFileWriter {
    log_dir: PathBuf,
    current_file: Option<File>,
    current_size: u64,
}

impl LogFileWriter {
    pub fn new() -> Result<Self, std::io::Error> {
        let log_dir = Self::get_log_directory();
        create_dir_all(&log_dir)?;

        Ok(LogFileWriter {
            log_dir,
            current_file: None,
            current_size: 0,
        })
    }

    fn get_log_directory() -> PathBuf {
        let mut path = dirs::config_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        path.push("trundle");
        path.push("logs");
        path
    }

    fn get_current_log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    fn rotate_logs(&mut self) -> Result<(), std::io::Error> {
        let current_path = self.get_current_log_path();

        // Close current file
        self.current_file = None;

        // Rotate existing log files
        for i in (1..LOG_FILE_MAX_COUNT).rev() {
            let old_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i));
            let new_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i + 1));

            if old_path.exists() {
                if i == LOG_FILE_MAX_COUNT - 1 {
                    std::fs::remove_file(&old_path)?;
                } else {
                    std::fs::rename(&old_path, &new_path)?;
                }
            }
        }

        // Move current log to .1
        if current_path.exists() {
            let archived_path = self.log_dir.join(format!("{}.1", LOG_FILE_NAME));
            std::fs::rename(&current_path, &archived_path)?;
        }

        self.current_size = 0;
        Ok(())
    }

    fn ensure_file_open(&mut self) -> Result<(), std::io::Error> {
        if self.current_file.is_none() {
            let path = self.get_current_log_path();
            self.current_file = Some(OpenOptions::new().create(true).append(true).open(&path)?);

            if let Ok(metadata) = std::fs::metadata(&path) {
                self.current_size = metadata.len();
            }
        }
        Ok(())
    }

    pub fn write_log(&mut self, log_msg: &LogMessage) -> Result<(), std::io::Error> {
        self.ensure_file_open()?;

        let formatted_log = format!("{}\n", log_msg);
        let log_bytes = formatted_log.as_bytes();

        if self.current_size + log_bytes.len() as u64 > LOG_FILE_MAX_SIZE {
            self.rotate_logs()?;
            self.ensure_file_open()?;
        }

        if let Some(ref mut file) = self.current_file {
            file.write_all(log_bytes)?;
            file.flush()?;
            self.current_size += log_bytes.len() as u64;
        }

        Ok(())
    }

    pub fn get_log_file_path(&self) -> PathBuf {
        self.get_current_log_path()
    }
}

/// Logger operating mode
#[derive(Debug, Clone)]
pub enum LoggerMode {
    /// Standalone mode: logs directly to terminal only
    Standalone,
    /// Embedded mode: logs through channel communication (for a host UI)
    Embedded(Sender<LogMessage>),
    /// File mode: logs to file only (for persistent logging)
    File,
    /// Full mode: logs to file and terminal
    Full,
}

/// Core logging system supporting standalone, embedded and file modes.
pub struct Logger {
    mode: Mutex<LoggerMode>,
    file_writer: Mutex<Option<LogFileWriter>>,
}

impl Logger {
    /// Create a new logger in standalone mode
    pub fn new_standalone() -> Self {
        Logger {
            mode: Mutex::new(LoggerMode::Standalone),
            file_writer: Mutex::new(None),
        }
    }

    /// Create a new logger in embedded mode with a channel sender
    pub fn new_embedded(sender: Sender<LogMessage>) -> Self {
        Logger {
            mode: Mutex::new(LoggerMode::Embedded(sender)),
            file_writer: Mutex::new(None),
        }
    }

    /// Create a new logger in file mode (logs to file only)
    pub fn new_file() -> Self {
        Logger {
            mode: Mutex::new(LoggerMode::File),
            file_writer: Mutex::new(Self::make_file_writer()),
        }
    }

    /// Create a new logger in full mode (logs to file and terminal)
    pub fn new_full() -> Self {
        Logger {
            mode: Mutex::new(LoggerMode::Full),
            file_writer: Mutex::new(Self::make_file_writer()),
        }
    }

    fn make_file_writer() -> Option<LogFileWriter> {
        match LogFileWriter::new() {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("Failed to create log file writer: {}", e);
                None
            }
        }
    }

    /// Switch to embedded mode with the provided channel sender
    pub fn set_embedded_mode(&self, sender: Sender<LogMessage>) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Embedded(sender);
        }
    }

    /// Switch to standalone mode
    pub fn set_standalone_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Standalone;
        }
    }

    /// Switch to file mode
    pub fn set_file_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::File;
        }
        self.ensure_file_writer();
    }

    /// Switch to full mode (file + terminal)
    pub fn set_full_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Full;
        }
        self.ensure_file_writer();
    }

    fn ensure_file_writer(&self) {
        if let Ok(mut file_writer) = self.file_writer.lock() {
            if file_writer.is_none() {
                *file_writer = Self::make_file_writer();
            }
        }
    }

    /// Get the current log file path (if file logging is enabled)
    pub fn get_log_file_path(&self) -> Option<PathBuf> {
        if let Ok(file_writer) = self.file_writer.lock() {
            file_writer.as_ref().map(|w| w.get_log_file_path())
        } else {
            None
        }
    }

    fn write_to_file(&self, log_msg: &LogMessage) {
        if let Ok(mut file_writer) = self.file_writer.lock() {
            if let Some(ref mut writer) = file_writer.as_mut() {
                if let Err(e) = writer.write_log(log_msg) {
                    eprintln!("Failed to write to log file: {}", e);
                }
            }
        }
    }

    fn write_to_terminal(log_msg: &LogMessage) {
        match log_msg.level {
            Severity::Error => {
                eprintln!("{}", log_msg);
                let _ = std::io::stderr().flush();
            }
            _ => {
                println!("{}", log_msg);
                let _ = std::io::stdout().flush();
            }
        }
    }

    /// Log a message with the specified severity
    pub fn log(&self, level: Severity, msg: String) {
        let log_msg = LogMessage::new(level, msg);

        if let Ok(mode) = self.mode.lock() {
            match &*mode {
                LoggerMode::Standalone => {
                    Self::write_to_terminal(&log_msg);
                }
                LoggerMode::Embedded(sender) => {
                    if sender.try_send(log_msg.clone()).is_err() {
                        // Fallback to terminal if channel is full/closed
                        eprintln!("Logger channel error: {}", log_msg);
                    }
                }
                LoggerMode::File => {
                    self.write_to_file(&log_msg);
                }
                LoggerMode::Full => {
                    self.write_to_file(&log_msg);
                    Self::write_to_terminal(&log_msg);
                }
            }
        }
    }

    /// Log with debug severity
    pub fn debug(&self, msg: String) {
        self.log(Severity::Debug, msg);
    }

    /// Log with info severity
    pub fn info(&self, msg: String) {
        self.log(Severity::Info, msg);
    }

    /// Log with warn severity
    pub fn warn(&self, msg: String) {
        self.log(Severity::Warn, msg);
    }

    /// Log with error severity
    pub fn error(&self, msg: String) {
        self.log(Severity::Error, msg);
    }
}

/// Initialize the global logger in standalone mode
pub fn init_standalone() {
    let _ = GLOBAL_LOGGER.set(Logger::new_standalone());
}

/// Initialize the global logger in embedded mode
pub fn init_embedded(sender: Sender<LogMessage>) {
    let _ = GLOBAL_LOGGER.set(Logger::new_embedded(sender));
}

/// Initialize the global logger in file mode
pub fn init_file() {
    let _ = GLOBAL_LOGGER.set(Logger::new_file());
}

/// Initialize the global logger in full mode
pub fn init_full() {
    let _ = GLOBAL_LOGGER.set(Logger::new_full());
}

/// Create a logging channel pair
pub fn create_log_channel() -> (Sender<LogMessage>, Receiver<LogMessage>) {
    unbounded()
}

/// Get the global logger instance
pub fn get_logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new_standalone)
}

/// Get the current log file path (if file logging is enabled)
pub fn get_log_file_path() -> Option<PathBuf> {
    get_logger().get_log_file_path()
}

/// Convenience macros for logging
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().error(format!($($arg)*))
    };
}

/// Drop-in replacement for println! that goes through the logging system
#[macro_export]
macro_rules! log_println {
    () => {
        $crate::logger::get_logger().info("".to_string())
    };
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}

/// Drop-in replacement for eprintln! that goes through the logging system
#[macro_export]
macro_rules! log_eprintln {
    () => {
        $crate::logger::get_logger().error("".to_string())
    };
    ($($arg:tt)*) => {
        $crate::logger::get_logger().error(format!($($arg)*))
    };
}
