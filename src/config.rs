use clap::Parser;
use log::LevelFilter;
use std::net::SocketAddr;

use crate::rules::Rules;

#[derive(Debug, Clone, Parser)]
#[command(name = "xiangqi-room", about = "Authoritative Xiangqi room server")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Let players make moves that leave their own general attacked
    #[arg(long)]
    pub allow_self_check: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn rules(&self) -> Rules {
        Rules {
            forbid_self_check: !self.allow_self_check,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
