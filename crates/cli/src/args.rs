//! Command-line arguments

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Semitia - run a command whenever files change
#[derive(Parser, Debug)]
#[command(name = "semitia")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to watch (default: current directory)
    #[arg(value_name = "DIRS")]
    pub dirs: Vec<PathBuf>,

    /// Run `deno task <task...> <path>` for each event
    #[arg(short, long, value_name = "TASK", conflicts_with = "shell", help_heading = "Actions")]
    pub task: Vec<String>,

    /// Run `<cmd...> <path>` for each event
    #[arg(short, long, value_name = "CMD", help_heading = "Actions")]
    pub shell: Vec<String>,

    /// Also dispatch events for `.dot` and `temp~` files
    #[arg(short, long, help_heading = "Actions")]
    pub all: bool,

    /// Print events as JSON lines instead of colored text
    #[arg(long, help_heading = "Actions")]
    pub json: bool,

    /// On created (touch and new)
    #[arg(short, long, help_heading = "Events")]
    pub create: bool,

    /// On written
    #[arg(short, long, help_heading = "Events")]
    pub modify: bool,

    /// On removed
    #[arg(short, long, help_heading = "Events")]
    pub remove: bool,

    /// On renamed
    #[arg(long = "move", help_heading = "Events")]
    pub moves: bool,

    /// Debounce threshold in milliseconds (default: 4)
    #[arg(long, value_name = "MS")]
    pub threshold: Option<u64>,

    /// Only watch the top level of each directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Config file (default: ./semitia.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Maximum log level for the subscriber
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }

        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("semitia").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = parse(&["src", "docs", "-s", "cargo", "-s", "check", "-c", "-r", "--threshold", "10"]).unwrap();

        assert_eq!(cli.dirs, vec![PathBuf::from("src"), PathBuf::from("docs")]);
        assert_eq!(cli.shell, vec!["cargo", "check"]);
        assert!(cli.task.is_empty());
        assert!(cli.create && cli.remove);
        assert!(!cli.modify && !cli.moves);
        assert_eq!(cli.threshold, Some(10));
    }

    #[test]
    fn test_task_conflicts_with_shell() {
        assert!(parse(&["-t", "build", "-s", "make", "-m"]).is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&[]).unwrap().log_level(), LevelFilter::WARN);
        assert_eq!(parse(&["-vv"]).unwrap().log_level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["-vvvv"]).unwrap().log_level(), LevelFilter::TRACE);
        assert_eq!(parse(&["-q"]).unwrap().log_level(), LevelFilter::ERROR);
        assert!(parse(&["-q", "-v"]).is_err());
    }
}
