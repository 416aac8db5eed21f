use clap::Parser;

/// CLI entry point for the publisher node. Most configuration lives in the
/// TOML file; only the handful of values an operator commonly overrides at
/// deploy time get their own flag, matching the `#[clap(long, env = "...")]`
/// pattern this workspace's binaries use throughout.
#[derive(Parser, Debug)]
#[command(name = "sp-node", about = "Shared Publisher coordination node")]
pub struct NodeOpts {
    #[clap(long, env = "SP_CONFIG", default_value = "sp.toml")]
    pub config: String,

    #[clap(long, env = "SP_LISTEN_ADDR", help = "Overrides server.listenAddr")]
    pub listen_addr: Option<String>,

    #[clap(long, env = "SP_METRICS_PORT", help = "Overrides metrics.port")]
    pub metrics_port: Option<u16>,
}
