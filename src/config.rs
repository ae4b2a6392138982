use clap::Parser;
use std::net::SocketAddr;

/// Runtime configuration, taken from command line flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "valhalla-exchange", about = "Single instrument limit order exchange", long_about = None)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "EXCHANGE_LISTEN_ADDR", default_value = "0.0.0.0:9999")]
    pub listen_addr: SocketAddr,
}
