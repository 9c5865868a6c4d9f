use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use strum_macros::Display;

use crate::config::upload::UPLOAD_KEYWORD;

/// The one thing a process run serves, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ServeTarget {
    File(PathBuf),
    Directory(PathBuf),
    Literal(String),
    UploadSink(PathBuf),
}

impl ServeTarget {
    /// Pick what to serve from the positional arguments.
    ///
    /// A single argument is checked against the upload keyword first, then against the file system.
    /// Everything else is served as text: the arguments joined by spaces followed by
    /// whatever `piped` yields (pass `None` when stdin is an interactive terminal).
    pub fn select<R: Read>(
        args: &[String],
        upload_dir: &Path,
        piped: Option<R>,
    ) -> Result<Self> {
        if let [arg] = args {
            if arg == UPLOAD_KEYWORD {
                return Ok(Self::UploadSink(upload_dir.to_path_buf()));
            }
            match fs::metadata(arg) {
                Ok(md) if md.is_dir() => return Ok(Self::Directory(PathBuf::from(arg))),
                Ok(_) => return Ok(Self::File(PathBuf::from(arg))),
                Err(e) => log::debug!("'{arg}' is not a path ({e}), serving it as text"),
            }
        }

        let mut text = args.join(" ");
        if let Some(mut input) = piped {
            let mut raw = Vec::new();
            input
                .read_to_end(&mut raw)
                .context("Failed reading from stdin")?;
            text.push_str(&String::from_utf8_lossy(&raw));
        }
        Ok(Self::Literal(text))
    }

    /// Short human readable description used in the startup banner
    pub fn describe(&self) -> String {
        match self {
            Self::File(p) | Self::Directory(p) => format!("Serving {}", p.display()),
            Self::Literal(_) => "Serving string".to_owned(),
            Self::UploadSink(p) => format!("Waiting for files (saving to {})", p.display()),
        }
    }
}
