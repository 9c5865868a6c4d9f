use anyhow::Result;
use clap_complete::Shell;

use self::{listen::ListenArgs, misc::cli_styles, upload::UploadArgs, util::*};

pub mod listen;
pub mod misc;
pub mod upload;
pub mod util;

#[derive(Debug, Parser)]
#[command(name = "Hub Share", version, styles = cli_styles())]
#[command(bin_name = "hub")]
/// Serve a file, a directory (zipped), a string or an upload page over HTTP.
///
/// `hub <FILE>` serves the file, `hub <DIR>` serves the directory as a zip archive,
/// `hub upload` receives uploads, anything else is served as text (with piped stdin appended).
/// Options go before the first word, everything after it is taken literally.
pub struct Config {
    /// What to serve: a path, the `upload` keyword, or words to serve as text
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    #[command(flatten)]
    pub listen: ListenArgs,

    #[command(flatten)]
    pub upload: UploadArgs,

    /// Pass many times for more log output
    ///
    /// By default, it'll report errors, warnings and info,
    /// `-v` enables debug messages, `-vv` for trace messages.
    #[arg(short, long, action = ArgAction::Count, default_value_t = 0, global = true)]
    pub verbose: u8,

    /// Silence all log output
    #[arg(short, long, action = ArgAction::SetTrue, conflicts_with("verbose"), global = true, env = "HUB_QUIET")]
    pub quiet: bool,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(long = "completions", value_hint = clap::ValueHint::Other, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Config {
    pub fn init() -> Result<Self> {
        let cfg = Self::parse();

        use stderrlog::LogLevelNum;
        let log_level: LogLevelNum = match cfg.verbose {
            0 => LogLevelNum::Info,
            1 => LogLevelNum::Debug,
            255 => LogLevelNum::Off,
            _ => LogLevelNum::Trace,
        };

        stderrlog::new()
            .verbosity(log_level)
            .quiet(cfg.quiet)
            .init()?;

        Ok(cfg)
    }

    /// Print a completion script for `shell` to stdout
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Self as clap::CommandFactory>::command(),
            "hub",
            &mut std::io::stdout(),
        );
    }
}
