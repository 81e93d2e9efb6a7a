mod logging;
mod opts;
mod simulate;

use agora_util_error::WhateverResult;
use clap::Parser as _;
use opts::{Commands, Opts};

pub struct Agora;

impl Agora {
    pub async fn run() -> WhateverResult<()> {
        logging::init_logging()?;

        let opts = Opts::parse();

        match opts.command {
            Commands::Simulate(opts) => simulate::run(opts).await,
        }
    }
}
