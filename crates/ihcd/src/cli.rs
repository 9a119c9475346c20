//! Command-line interface of the bridge daemon.

use std::path::PathBuf;

use clap::Parser;

/// Bridge daemon connecting an LK IHC controller to a home-automation hub.
///
/// Runs the device-synchronization engine against the configured device
/// set. The controller transport is pluggable; this build ships with the
/// deterministic simulator, selected by default.
#[derive(Debug, Parser)]
#[command(name = "ihcd", version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "ihcd.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. `info` or `ihcd_core=debug` (overrides IHCD_LOG).
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["ihcd"]);
        assert_eq!(cli.config, PathBuf::from("ihcd.toml"));
        assert!(!cli.check);
        assert!(cli.log.is_none());
    }
}
