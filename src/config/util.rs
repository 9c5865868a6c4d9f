pub use {
    clap::{
        builder::styling::{AnsiColor, Effects, Styles},
        ArgAction, Args, Parser,
    },
    std::path::PathBuf,
};
