use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "defect-dashboard")]
#[command(about = "QA defect analytics dashboard", long_about = None)]
pub struct Cli {
    /// Defect file to open (.csv, .json or .parquet). Defaults to the
    /// configured `default_data_file`.
    pub data: Option<PathBuf>,

    /// Config file (JSON). Defaults to the per-user config location.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the dashboard views as JSON and exit, without opening a window
    #[arg(long)]
    pub summary: bool,

    /// Write the filtered defects as CSV to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

impl Cli {
    pub fn headless(&self) -> bool {
        self.summary || self.export.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_flags() {
        let cli = Cli::parse_from(["defect-dashboard", "data.csv", "--summary", "--export", "out.csv"]);
        assert_eq!(cli.data, Some(PathBuf::from("data.csv")));
        assert!(cli.summary);
        assert!(cli.headless());
    }

    #[test]
    fn no_arguments_opens_the_ui() {
        let cli = Cli::parse_from(["defect-dashboard"]);
        assert!(cli.data.is_none());
        assert!(!cli.headless());
    }
}
