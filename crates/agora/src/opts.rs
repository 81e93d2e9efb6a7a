use std::time::Duration;

use agora_election::config::ElectionConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Opts {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run a whole parliament in this process: elect a leader, then agree
    /// on a few blocks
    Simulate(SimulateOpts),
}

#[derive(Args, Debug)]
pub(crate) struct SimulateOpts {
    /// Number of representatives
    #[arg(long, env = "AGORA_NODES", default_value = "4", value_parser = clap::value_parser!(u64).range(2..))]
    pub nodes: u64,

    /// Number of blocks to agree on, one round at a time
    #[arg(long, env = "AGORA_BLOCKS", default_value = "3")]
    pub blocks: u64,

    #[arg(long, env = "AGORA_TICK_MS", default_value = "1")]
    pub tick_ms: u64,

    #[arg(long, env = "AGORA_ELECTION_TIMEOUT_MIN_MS", default_value = "150")]
    pub election_timeout_min_ms: u64,

    #[arg(long, env = "AGORA_ELECTION_TIMEOUT_MAX_MS", default_value = "300")]
    pub election_timeout_max_ms: u64,

    #[arg(long, env = "AGORA_RAFT_HARD_TIMEOUT_SECS", default_value = "10")]
    pub raft_hard_timeout_secs: u64,

    /// How long to wait for the leader and for each block
    #[arg(long, env = "AGORA_WAIT_SECS", default_value = "15")]
    pub wait_secs: u64,
}

impl SimulateOpts {
    pub fn election_config(&self) -> ElectionConfig {
        ElectionConfig {
            tick: Duration::from_millis(self.tick_ms),
            timeout_min: Duration::from_millis(self.election_timeout_min_ms),
            timeout_max: Duration::from_millis(self.election_timeout_max_ms),
            hard_timeout: Duration::from_secs(self.raft_hard_timeout_secs),
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::{Commands, Opts};

    #[test]
    fn simulate_defaults() {
        let opts = Opts::try_parse_from(["agora", "simulate"]).expect("valid args");
        let Commands::Simulate(opts) = opts.command;

        assert_eq!(opts.nodes, 4);
        assert_eq!(opts.blocks, 3);
        assert_eq!(opts.election_config(), Default::default());
    }

    #[test]
    fn simulate_needs_two_nodes() {
        assert!(Opts::try_parse_from(["agora", "simulate", "--nodes", "1"]).is_err());
        assert!(Opts::try_parse_from(["agora", "simulate", "--nodes", "2"]).is_ok());
    }
}
