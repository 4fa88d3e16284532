//! Provides a means to read, parse and hold configuration options for scans.
use crate::scanner::{ConfigError, ScanRequest};
use clap::Parser;
use serde_derive::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const LOWEST_PORT_NUMBER: u16 = 1;
const TOP_PORT_NUMBER: u16 = 65535;

/// An inclusive range of ports, written `start-end` on the command line.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[cfg(not(tarpaulin_include))]
pub fn parse_port_range(range_str: &str) -> Result<PortRange, String> {
    let range_parts: Vec<&str> = range_str.trim().split('-').collect();
    if range_parts.len() != 2 {
        return Err(format!(
            "Invalid range format '{range_str}'. Expected 'start-end'. Example: 1-1000.",
        ));
    }

    let start: u16 = range_parts[0].trim().parse().map_err(|_| {
        format!(
            "Invalid start port '{}' in range '{range_str}'",
            range_parts[0]
        )
    })?;
    let end: u16 = range_parts[1].trim().parse().map_err(|_| {
        format!(
            "Invalid end port '{}' in range '{range_str}'",
            range_parts[1]
        )
    })?;

    if start > end {
        return Err(format!(
            "Start port {start} is greater than end port {end} in range '{range_str}'",
        ));
    }

    if start < LOWEST_PORT_NUMBER {
        return Err(format!(
            "Ports in range '{range_str}' must be between {LOWEST_PORT_NUMBER} and {TOP_PORT_NUMBER}",
        ));
    }

    Ok(PortRange { start, end })
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "portsweep",
    version = env!("CARGO_PKG_VERSION"),
    max_term_width = 120,
    help_template = "{bin} {version}\n{about}\n\nUSAGE:\n    {usage}\n\nOPTIONS:\n{options}",
)]
#[allow(clippy::struct_excessive_bools)]
/// Concurrent TCP connect port scanner.
/// Prints a JSON summary of the open ports on stdout, status lines on stderr.
/// WARNING Only scan hosts you are allowed to scan.
pub struct Opts {
    /// The host to scan, as an IP address or a name.
    #[arg(short = 'a', long, alias = "address", default_value = "127.0.0.1")]
    pub host: String,

    /// First port of the range.
    #[arg(short, long, default_value = "1")]
    pub start: u16,

    /// Last port of the range, inclusive.
    #[arg(short, long, default_value = "1024")]
    pub end: u16,

    /// The whole range at once, e.g. 8000-8100. Replaces --start and --end.
    #[arg(short, long, value_parser = parse_port_range, conflicts_with_all = ["start", "end"])]
    pub range: Option<PortRange>,

    /// How many ports are probed at the same time. Every worker holds one
    /// socket, so this is bounded by the open file limit of your OS.
    #[arg(short, long, default_value = "100")]
    pub workers: usize,

    /// The timeout in milliseconds before a port is assumed to be closed.
    #[arg(short, long, default_value = "500")]
    pub timeout: u32,

    /// Also report closed and unreachable ports while scanning.
    #[arg(short, long)]
    pub verbose: bool,

    /// Greppable mode. Only print `host -> [ports]` on stdout, nothing on stderr.
    #[arg(short, long)]
    pub greppable: bool,

    /// Accessible mode. Turns off features which negatively affect screen readers.
    #[arg(long)]
    pub accessible: bool,

    /// A comma-delimited list or file of DNS resolvers.
    #[arg(long)]
    pub resolver: Option<String>,

    /// Automatically ups the ULIMIT with the value you provided.
    #[arg(short, long)]
    pub ulimit: Option<u64>,

    /// Whether to ignore the configuration file or not.
    #[arg(short, long)]
    pub no_config: bool,

    /// Custom path to config file
    #[arg(short, long, value_parser)]
    pub config_path: Option<PathBuf>,
}

#[cfg(not(tarpaulin_include))]
impl Opts {
    pub fn read() -> Self {
        let mut opts = Self::parse();

        if let Some(range) = opts.range.take() {
            opts.start = range.start;
            opts.end = range.end;
        }

        opts
    }

    /// Reads the command line arguments into an Opts struct and merge
    /// values found within the user configuration file.
    pub fn merge(&mut self, config: &Config) {
        if !self.no_config {
            self.merge_required(config);
            self.merge_optional(config);
        }
    }

    fn merge_required(&mut self, config: &Config) {
        macro_rules! merge_required {
            ($($field: ident),+) => {
                $(
                    if let Some(e) = &config.$field {
                        self.$field = e.clone();
                    }
                )+
            }
        }

        merge_required!(host, workers, timeout, verbose, greppable, accessible);

        if let Some(range) = config.range {
            self.start = range.start;
            self.end = range.end;
        }
    }

    fn merge_optional(&mut self, config: &Config) {
        macro_rules! merge_optional {
            ($($field: ident),+) => {
                $(
                    if config.$field.is_some() {
                        self.$field = config.$field.clone();
                    }
                )+
            }
        }

        merge_optional!(resolver, ulimit);
    }

    /// Validates the options into the request a scanner runs.
    pub fn to_request(&self) -> Result<ScanRequest, ConfigError> {
        let (start, end) = self
            .range
            .map_or((self.start, self.end), |range| (range.start, range.end));

        ScanRequest::new(
            self.host.as_str(),
            start,
            end,
            self.workers,
            Duration::from_millis(self.timeout.into()),
        )
        .map(|request| request.verbose(self.verbose))
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            start: LOWEST_PORT_NUMBER,
            end: 1024,
            range: None,
            workers: 100,
            timeout: 500,
            verbose: false,
            greppable: true,
            accessible: false,
            resolver: None,
            ulimit: None,
            no_config: true,
            config_path: None,
        }
    }
}

/// Struct used to deserialize the options specified within our config file.
/// These will be further merged with our command line arguments in order to
/// generate the final Opts struct.
#[cfg(not(tarpaulin_include))]
#[derive(Debug, Deserialize)]
pub struct Config {
    host: Option<String>,
    range: Option<PortRange>,
    workers: Option<usize>,
    timeout: Option<u32>,
    verbose: Option<bool>,
    greppable: Option<bool>,
    accessible: Option<bool>,
    resolver: Option<String>,
    ulimit: Option<u64>,
}

#[cfg(not(tarpaulin_include))]
impl Config {
    /// Reads the configuration file with TOML format and parses it into a
    /// Config struct. A missing file is the same as an empty one.
    ///
    /// # Format
    ///
    /// host = "192.168.1.10"
    /// range = { start = 1, end = 1024 }
    /// workers = 200
    /// timeout = 500
    /// verbose = false
    ///
    pub fn read(custom_config_path: Option<PathBuf>) -> Result<Self, toml::de::Error> {
        let mut content = String::new();
        let config_path = custom_config_path.or_else(default_config_path);
        if let Some(config_path) = config_path.filter(|path| path.exists()) {
            content = fs::read_to_string(config_path).unwrap_or_default();
        }

        toml::from_str(&content)
    }
}

/// Constructs default path to config toml, if there is a home directory.
pub fn default_config_path() -> Option<PathBuf> {
    let mut config_path = dirs::home_dir()?;
    config_path.push(".portsweep.toml");
    Some(config_path)
}
