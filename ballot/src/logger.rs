//! # Summary
//!
//! Log output for the binaries. Everything goes to stderr so it never
//! interleaves with the client's prompts on stdout.

use std::time::SystemTime;

use log::LevelFilter;

/// Maps `-v` occurrences to a level: info by default, then debug, then trace.
pub fn level(verbosity: u8) -> LevelFilter {
    match verbosity {
    | 0 => LevelFilter::Info,
    | 1 => LevelFilter::Debug,
    | _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. Fails if one is already installed.
pub fn init(verbosity: u8) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message,
            ))
        })
        .level(level(verbosity))
        .chain(std::io::stderr())
        .apply()
}
