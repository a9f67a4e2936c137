use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "codepad", about = "Terminal code editor that runs code on a remote lesson server", version)]
pub struct Cli {
    /// Screen index; each screen keeps its own source, output and selection.
    #[arg(long, default_value_t = 0)]
    pub screen: u32,

    /// Notebook JSON providing the lesson number and data files.
    #[arg(long, value_name = "PATH")]
    pub notebook: Option<PathBuf>,

    /// Override API_BASE_URL for this invocation.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the editor (default).
    Edit,

    /// Run code once and print the result.
    Run {
        /// Source file; stdin or the saved source when omitted.
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print the named variable after the console output.
        /// Can be used multiple times: --show df --show x
        #[arg(long = "show", action = clap::ArgAction::Append, conflicts_with = "json")]
        show: Vec<String>,

        /// Write image variables into this directory.
        #[arg(long = "save-images", value_name = "DIR")]
        save_images: Option<PathBuf>,

        /// Print the raw response as JSON (failures too, as `{"output": <message>, "variables": {}}`).
        #[arg(long)]
        json: bool,
    },

    /// Show or clear the saved state of a screen.
    State {
        /// Remove the saved source, output and selection.
        #[arg(long)]
        clear: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_editor() {
        let cli = Cli::try_parse_from(["codepad"]).unwrap();
        assert_eq!(cli.screen, 0);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_run_with_repeated_show() {
        let cli = Cli::try_parse_from([
            "codepad", "--screen", "2", "run", "main.py", "--show", "df", "--show", "x",
        ])
        .unwrap();
        assert_eq!(cli.screen, 2);
        match cli.command {
            Some(Command::Run { file, show, json, .. }) => {
                assert_eq!(file, Some(PathBuf::from("main.py")));
                assert_eq!(show, vec!["df", "x"]);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_show_conflicts_with_json() {
        let err = Cli::try_parse_from(["codepad", "run", "--json", "--show", "df"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert!(Cli::try_parse_from(["codepad", "run", "--json"]).is_ok());
    }
}
