use std::io;

use anyhow::{Context, Result};

use crate::{config::Config, server, target::ServeTarget};

pub fn run(cfg: &Config) -> Result<()> {
    if let Some(shell) = cfg.completions {
        Config::generate_completion_script(shell);
        return Ok(());
    }

    let stdin = io::stdin();
    let piped = stdin_has_input(&stdin)?.then(|| stdin.lock());
    let target = ServeTarget::select(&cfg.args, &cfg.upload.dir, piped)?;
    log::trace!("{target:?}");

    server::listen(cfg, &target)
}

/// Whether stdin is a pipe or a redirected non-empty file.
///
/// Terminals, sockets, `/dev/null` and empty files are never read, so startup can't stall
/// on a parent that keeps stdin open without writing to it.
#[cfg(unix)]
fn stdin_has_input(stdin: &io::Stdin) -> Result<bool> {
    use std::os::fd::AsFd;

    let metadata = stdin
        .as_fd()
        .try_clone_to_owned()
        .map(std::fs::File::from)
        .and_then(|f| f.metadata())
        .context("Failed inspecting stdin")?;
    Ok(is_piped_input(&metadata))
}

#[cfg(not(unix))]
fn stdin_has_input(stdin: &io::Stdin) -> Result<bool> {
    use std::io::IsTerminal;
    Ok(!stdin.is_terminal())
}

#[cfg(unix)]
fn is_piped_input(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;

    let file_type = metadata.file_type();
    log::trace!("stdin: {file_type:?}, {} B", metadata.len());
    file_type.is_fifo() || (file_type.is_file() && metadata.len() > 0)
}
