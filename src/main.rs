use anyhow::Result;
use hub_share::{config::Config, run::run};

fn main() -> Result<()> {
    let cfg = Config::init()?;

    log::trace!("{cfg:?}");

    run(&cfg)
}
