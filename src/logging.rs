use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use env_logger::{Builder, Target, WriteStyle};
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Groups of modules whose log level can be set together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LoggingSubsystem {
    /// Application entry point and CLI
    Main,
    /// Player controllers, notification decoding and the engine
    Players,
    /// REST and streaming transport
    Http,
    /// Async runtime and sockets
    Network,
    /// Configuration loading
    Config,
    /// Third-party dependencies
    #[strum(serialize = "deps", serialize = "dependencies")]
    #[serde(rename = "deps")]
    Deps,
}

impl LoggingSubsystem {
    /// Module prefixes covered by this subsystem, comma separated
    pub fn module_prefix(&self) -> &'static str {
        match self {
            LoggingSubsystem::Main => "beocontrol",
            LoggingSubsystem::Players => "beocontrol::players",
            LoggingSubsystem::Http => "beocontrol::helpers::http_client,reqwest,hyper,hyper_util",
            LoggingSubsystem::Network => "tokio,mio",
            LoggingSubsystem::Config => "beocontrol::config",
            LoggingSubsystem::Deps => "serde,h2,rustls",
        }
    }
}

/// Logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// stdout or stderr
    #[serde(default = "default_target")]
    pub target: String,

    #[serde(default = "default_timestamps")]
    pub timestamps: bool,

    #[serde(default = "default_colors")]
    pub colors: bool,

    /// Subsystem (or raw module path) to level
    #[serde(default)]
    pub subsystems: HashMap<String, String>,

    #[serde(default)]
    pub include_module_path: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_target() -> String {
    "stderr".to_string()
}

fn default_timestamps() -> bool {
    true
}

fn default_colors() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            target: default_target(),
            timestamps: default_timestamps(),
            colors: default_colors(),
            subsystems: HashMap::new(),
            include_module_path: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read logging config file: {}", e))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse logging config: {}", e))
    }

    fn parse_log_level(level: &str) -> LevelFilter {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'info'", level);
            LevelFilter::Info
        })
    }

    /// (module prefix, level) pairs from the subsystem table
    fn module_filters(&self) -> Vec<(String, LevelFilter)> {
        let mut filters = Vec::new();
        for (name, level) in &self.subsystems {
            let level = Self::parse_log_level(level);
            match LoggingSubsystem::from_str(name) {
                Ok(subsystem) => {
                    for prefix in subsystem.module_prefix().split(',') {
                        filters.push((prefix.trim().to_string(), level));
                    }
                }
                // Anything else is taken as a module path
                Err(_) => filters.push((name.clone(), level)),
            }
        }
        filters.sort();
        filters
    }

    /// env_logger style filter equivalent to this configuration
    pub fn build_filter_string(&self) -> String {
        let mut parts = vec![self.level.to_lowercase()];
        for (module, level) in self.module_filters() {
            parts.push(format!("{}={}", module, level.to_string().to_lowercase()));
        }
        parts.join(",")
    }

    pub fn initialize_logger(&self) -> Result<(), String> {
        let target = match self.target.to_lowercase().as_str() {
            "stdout" => Target::Stdout,
            "stderr" => Target::Stderr,
            other => return Err(format!("Unknown logging target: {}", other)),
        };

        let mut builder = Builder::new();
        builder.parse_env("RUST_LOG");
        builder.filter(None, Self::parse_log_level(&self.level));
        for (module, level) in self.module_filters() {
            builder.filter(Some(&module), level);
        }
        builder.target(target);
        builder.write_style(if self.colors { WriteStyle::Auto } else { WriteStyle::Never });

        let timestamps = self.timestamps;
        let include_module_path = self.include_module_path;
        builder.format(move |buf, record| {
            if timestamps {
                write!(buf, "[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))?;
            }
            write!(buf, "[{}] ", record.level())?;
            if include_module_path {
                if let Some(module) = record.module_path() {
                    write!(buf, "[{}] ", module)?;
                }
            }
            writeln!(buf, "{}", record.args())
        });

        builder.try_init().map_err(|e| format!("Failed to initialize logger: {}", e))?;

        let filter_string = self.build_filter_string();
        info!("Logging initialized with filter: {}", filter_string);
        debug!("Logging target: {}", self.target);
        Ok(())
    }
}

/// Initialize logging from the CLI options
///
/// `level` overrides the configured level; `debug` forces debug output for the players.
pub fn initialize_logging(config_file: Option<&Path>, level: Option<&str>, debug: bool) -> Result<(), String> {
    let mut config = match config_file {
        Some(path) if path.exists() => LoggingConfig::from_file(path)?,
        Some(path) => {
            eprintln!("Logging config file {:?} not found, using defaults", path);
            LoggingConfig::default()
        }
        None => LoggingConfig::default(),
    };

    if let Some(level) = level {
        config.level = level.to_string();
    }
    if debug {
        config.subsystems.insert(LoggingSubsystem::Players.to_string(), "debug".to_string());
    }

    config.initialize_logger()?;
    if debug {
        warn!("Debug logging enabled for players");
    }
    Ok(())
}
