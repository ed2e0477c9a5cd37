//! Configuration and CLI argument handling

use clap::Parser;

use crate::{host::Role, state::TimerSpec};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "dynamic-timers")]
#[command(about = "Server-authoritative named timers replicated as lifecycle events")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Role of this process; observers reject every mutation
    #[arg(short, long, value_enum, default_value = "authority")]
    pub role: Role,

    /// Timer to register at startup, as ID=SECONDS (repeatable)
    #[arg(short, long = "timer", value_name = "ID=SECONDS", value_parser = parse_timer_spec)]
    pub timers: Vec<TimerSpec>,

    /// Start every preregistered timer immediately
    #[arg(long)]
    pub autostart: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

/// Parse `ID=SECONDS` into a registration entry
pub fn parse_timer_spec(raw: &str) -> Result<TimerSpec, String> {
    let (id, seconds) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=SECONDS, got '{}'", raw))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing timer id in '{}'", raw));
    }

    let duration: f64 = seconds
        .trim()
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", seconds, e))?;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(format!("duration must be positive, got {}", duration));
    }

    Ok(TimerSpec::new(id, duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timer_specs() {
        assert_eq!(
            parse_timer_spec("round=90").unwrap(),
            TimerSpec::new("round", 90.0)
        );
        assert_eq!(
            parse_timer_spec(" warmup = 2.5 ").unwrap(),
            TimerSpec::new("warmup", 2.5)
        );
    }

    #[test]
    fn rejects_bad_timer_specs() {
        assert!(parse_timer_spec("round").is_err());
        assert!(parse_timer_spec("=5").is_err());
        assert!(parse_timer_spec("round=abc").is_err());
        assert!(parse_timer_spec("round=0").is_err());
    }

    #[test]
    fn cli_defaults_and_flags() {
        let config = Config::try_parse_from([
            "dynamic-timers",
            "--role",
            "observer",
            "-t",
            "a=5",
            "--timer",
            "b=10",
            "--autostart",
        ])
        .unwrap();

        assert_eq!(config.role, Role::Observer);
        assert_eq!(config.timers.len(), 2);
        assert!(config.autostart);
        assert_eq!(config.address(), "0.0.0.0:20554");
        assert_eq!(config.log_level(), "info");
    }
}
