//! Logging wrapper used throughout every crate in the workspace. Only the
//! `embercoin` binary ever calls [`init_logger`]; library crates log
//! through the plain `log` macros.

use std::ops::Deref;
use std::{panic, thread};

use backtrace::Backtrace;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::append::rolling_file::{
    policy::compound::roll::fixed_window::FixedWindowRoller,
    policy::compound::trigger::size::SizeTrigger, policy::compound::CompoundPolicy,
    RollingFileAppender,
};
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::{threshold::ThresholdFilter, Filter, Response};
use parking_lot::Mutex;

use crate::types::{LogLevel, LoggingConfig};

fn convert_log_level(level: &LogLevel) -> LevelFilter {
    match *level {
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Warning => LevelFilter::Warn,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
        LogLevel::Error => LevelFilter::Error,
    }
}

static WAS_INIT: Mutex<bool> = Mutex::new(false);
static LOGGING_CONFIG: Mutex<Option<LoggingConfig>> = Mutex::new(None);

const LOGGING_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {M} - {m}{n}";

/// Rejects log records outside the workspace's own crates, so third-party
/// dependency chatter doesn't drown out the log file.
#[derive(Debug)]
struct EmberFilter;

impl Filter for EmberFilter {
    fn filter(&self, record: &log::Record<'_>) -> Response {
        match record.module_path() {
            Some(path) if path.starts_with("ember") || path.starts_with("embercoin") => Response::Neutral,
            _ => Response::Reject,
        }
    }
}

/// Initializes the process-wide logger. A no-op on the second call.
pub fn init_logger(config: LoggingConfig) {
    let mut was_init = WAS_INIT.lock();
    if *was_init {
        return;
    }

    *LOGGING_CONFIG.lock() = Some(config.clone());

    let level_stdout = convert_log_level(&config.stdout_log_level);
    let level_file = convert_log_level(&config.file_log_level);
    let level_minimum = level_stdout.max(level_file);

    let mut root = Root::builder();
    let mut appenders = Vec::new();

    if config.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
            .build();
        appenders.push(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level_stdout)))
                .filter(Box::new(EmberFilter))
                .build("stdout", Box::new(stdout)),
        );
        root = root.appender("stdout");
    }

    if config.log_to_file {
        let file: Box<dyn Append> = if let Some(size) = config.log_max_size {
            let roller = FixedWindowRoller::builder()
                .build(&format!("{}.{{}}.gz", config.log_file_path), 8)
                .expect("valid rolling file pattern");
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(size)), Box::new(roller));
            Box::new(
                RollingFileAppender::builder()
                    .append(config.log_file_append)
                    .encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
                    .build(&config.log_file_path, Box::new(policy))
                    .expect("writable log file path"),
            )
        } else {
            Box::new(
                FileAppender::builder()
                    .append(config.log_file_append)
                    .encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
                    .build(&config.log_file_path)
                    .expect("writable log file path"),
            )
        };
        appenders.push(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level_file)))
                .filter(Box::new(EmberFilter))
                .build("file", file),
        );
        root = root.appender("file");
    }

    let log_config = Config::builder()
        .appenders(appenders)
        .build(root.build(level_minimum))
        .expect("valid log4rs config");

    log4rs::init_config(log_config).expect("logger not already initialized by another crate");
    *was_init = true;

    log::info!(
        "logger initialized: stdout={:?} file={:?} minimum={:?}",
        level_stdout,
        level_file,
        level_minimum
    );

    send_panics_to_log();
}

/// A stdout-only logger for unit and integration tests.
pub fn init_test_logger() {
    let mut was_init = WAS_INIT.lock();
    if *was_init {
        return;
    }
    let mut config = LoggingConfig::default();
    config.log_to_file = false;
    *LOGGING_CONFIG.lock() = Some(config.clone());

    let level = convert_log_level(&config.stdout_log_level);
    let stdout = ConsoleAppender::builder().build();
    let appender = Appender::builder()
        .filter(Box::new(ThresholdFilter::new(level)))
        .filter(Box::new(EmberFilter))
        .build("stdout", Box::new(stdout));

    let log_config = Config::builder()
        .appenders(vec![appender])
        .build(Root::builder().appender("stdout").build(level))
        .expect("valid log4rs config");

    let _ = log4rs::init_config(log_config);
    *was_init = true;
}

fn send_panics_to_log() {
    panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::new();
        let thread = thread::current();
        let thread = thread.name().unwrap_or("unnamed");
        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => s.to_string(),
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Box<Any>".to_string(),
            },
        };
        match info.location() {
            Some(location) => log::error!(
                "thread '{}' panicked at '{}': {}:{}\n{:?}",
                thread,
                msg,
                location.file(),
                location.line(),
                backtrace
            ),
            None => log::error!("thread '{}' panicked at '{}'\n{:?}", thread, msg, backtrace),
        }
        if let Some(config) = LOGGING_CONFIG.lock().deref() {
            eprintln!(
                "thread '{}' panicked with message:\n\"{}\"\nsee {} for details.",
                thread, msg, config.log_file_path
            );
        }
    }));
}
