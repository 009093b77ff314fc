//! redis.conf-style configuration file loading.
//!
//! Grounded in `examples/yijun-tang-rudis/src/redis/config.rs`'s
//! `load_server_config`: a hand-rolled, line-oriented directive parser
//! kept in the teacher's own idiom rather than swapped for a serde-based
//! format, since the pack gives no reason to replace a dozen-scalar-field
//! ad hoc parser with something heavier.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::Level;

/// Resolved server configuration: built-in defaults, overridden by a
/// config file, in turn overridden by CLI flags (spec.md §6, precedence
/// documented in SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_host: String,
    pub databases: u8,
    pub periodic_flush_enabled: bool,
    pub periodic_flush_seconds: f32,
    pub backlog: u32,
    pub dir: String,
    pub loglevel: Level,
    pub daemonize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 6380,
            bind_host: "::".to_string(),
            databases: 16,
            periodic_flush_enabled: true,
            periodic_flush_seconds: 60.0,
            backlog: 1024,
            dir: ".".to_string(),
            loglevel: Level::INFO,
            daemonize: false,
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub line_num: usize,
    pub line: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "config error at line {}: '{}': {}",
            self.line_num, self.line, self.message
        )
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Loads directives from `path` on top of the current values,
    /// returning the first malformed directive encountered (the teacher
    /// aborts the whole process on a bad line; this crate lets `main`
    /// decide what to do with the error instead).
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError {
            line_num: 0,
            line: String::new(),
            message: format!("can't open config file: {e}"),
        })?;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line_num = idx + 1;
            let line = line.map_err(|e| ConfigError {
                line_num,
                line: String::new(),
                message: format!("can't read line: {e}"),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.apply_directive(trimmed, line_num)?;
        }
        Ok(())
    }

    fn apply_directive(&mut self, line: &str, line_num: usize) -> Result<(), ConfigError> {
        let argv: Vec<&str> = line.split_whitespace().collect();
        let argc = argv.len();
        let err = |message: &str| ConfigError {
            line_num,
            line: line.to_string(),
            message: message.to_string(),
        };

        match argv[0].to_ascii_lowercase().as_str() {
            "port" if argc == 2 => {
                self.port = argv[1].parse().map_err(|_| err("invalid port"))?;
            }
            "bind" if argc == 2 => {
                self.bind_host = argv[1].to_string();
            }
            "databases" if argc == 2 => {
                let n: u8 = argv[1].parse().map_err(|_| err("invalid database count"))?;
                if n == 0 {
                    return Err(err("database count must be at least 1"));
                }
                self.databases = n;
            }
            "periodic-flush-enabled" if argc == 2 => {
                self.periodic_flush_enabled = yes_no(argv[1]).map_err(|e| err(&e))?;
            }
            "periodic-flush-seconds" if argc == 2 => {
                self.periodic_flush_seconds = argv[1]
                    .parse()
                    .map_err(|_| err("invalid periodic-flush-seconds"))?;
            }
            "backlog" if argc == 2 => {
                self.backlog = argv[1].parse().map_err(|_| err("invalid backlog"))?;
            }
            "dir" if argc == 2 => {
                self.dir = argv[1].to_string();
            }
            "loglevel" if argc == 2 => {
                self.loglevel = parse_loglevel(argv[1]).map_err(|e| err(&e))?;
            }
            "daemonize" if argc == 2 => {
                // Parsed for config-file compatibility; this crate never forks.
                self.daemonize = yes_no(argv[1]).map_err(|e| err(&e))?;
            }
            _ => return Err(err("bad directive or wrong number of arguments")),
        }
        Ok(())
    }
}

fn yes_no(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err("argument must be 'yes' or 'no'".to_string()),
    }
}

fn parse_loglevel(s: &str) -> Result<Level, String> {
    match s.to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "verbose" => Ok(Level::TRACE),
        "notice" => Ok(Level::INFO),
        "warning" => Ok(Level::WARN),
        _ => Err("must be one of debug, verbose, notice or warning".to_string()),
    }
}
