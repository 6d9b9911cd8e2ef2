use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding the spectrum or feature map to draw
    pub input: PathBuf,

    /// Where to write the SVG
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Path to the JSON configuration file, missing fields take defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also draw the profile view linked to a feature map (written next to
    /// the output as <OUTPUT>.profile.svg)
    #[arg(short, long)]
    pub linked: bool,

    /// Zoom onto this range of the primary axis before writing
    #[arg(short, long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub extent: Option<Vec<f64>>,

    /// Increase logging verbosity (can be repeated: -v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (can be repeated: -q for warn, -qq for error)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Default log level from the verbosity flags. `RUST_LOG` still wins.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (v, _) if v >= 2 => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        match self.extent.as_deref() {
            Some([min, max]) => Some((*min, *max)),
            _ => None,
        }
    }

    pub fn profile_output(&self) -> PathBuf {
        self.output.with_extension("profile.svg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::parse_from([
            "mzcanvas", "map.json", "-o", "out.svg", "--linked", "--extent", "400", "600", "-vv",
        ]);
        assert!(cli.linked);
        assert_eq!(cli.extent(), Some((400.0, 600.0)));
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.profile_output(), PathBuf::from("out.profile.svg"));
    }

    #[test]
    fn test_quiet_lowers_level() {
        let cli = Cli::parse_from(["mzcanvas", "s.json", "-o", "s.svg", "-q"]);
        assert_eq!(cli.log_level(), "warn");
        assert_eq!(cli.extent(), None);
        assert!(cli.config.is_none());
    }
}
