//! Inspector for block channel ring slots and store attributes

mod config;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use blkgate_proto::{
    kv::AttrMap,
    ring::{Abi, Request, Response},
    types::Protocol,
    DiskInfo, FeatureIndirect, RingInfo,
};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use tracing::Level;

#[derive(Parser)]
pub(crate) struct Opts {
    /// Control the level of output to stdout (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the store writes that wire up a device described in a config file
    Plan {
        /// Path to the device configuration file
        config: PathBuf,
    },

    /// Decode a request slot captured from a shared ring
    Request {
        /// Path to a file holding the raw slot bytes
        slot: PathBuf,

        /// Negotiated protocol fixing the slot layout
        #[arg(short, long, default_value = "native")]
        protocol: String,
    },

    /// Decode a response slot captured from a shared ring
    Response {
        /// Path to a file holding the raw slot bytes
        slot: PathBuf,
    },

    /// Decode a key=value attribute dump into a typed descriptor
    Attrs {
        /// Path to a file with one key=value pair per line
        dump: PathBuf,

        /// Which descriptor the dump describes
        #[arg(short, long)]
        kind: AttrKind,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum AttrKind {
    /// Frontend ring advertisement (ring-ref / event-channel / protocol)
    Ring,

    /// Backend geometry advertisement (sector-size / sectors / info)
    Disk,

    /// Frontend indirect-segment advertisement
    Indirect,
}

/// Resolves a protocol string from the command line into a slot layout
fn parse_abi(raw: &str) -> Result<Abi> {
    Protocol::parse(raw)
        .map(Abi::from)
        .ok_or_else(|| anyhow!("unknown protocol: {raw}"))
}

/// Parses a key=value-per-line dump into an attribute map
fn load_attrs(path: &Path) -> Result<AttrMap> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read attribute dump {}", path.display()))?;

    let mut attrs = AttrMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("malformed attribute line: {line}"))?;
        attrs.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(attrs)
}

fn run(opts: Opts) -> Result<()> {
    match opts.command {
        Command::Plan { config } => {
            let cfg = Config::load(config)?;
            tracing::debug!(?cfg, "configuration");

            for (domid, path, value) in cfg.connection().initial_writes() {
                println!("{domid:>5} {path} = {value:?}");
            }
        }
        Command::Request { slot, protocol } => {
            let abi = parse_abi(&protocol)?;
            let bytes = fs::read(&slot)
                .with_context(|| format!("unable to read slot file {}", slot.display()))?;

            let request = Request::read(abi, &bytes)?;
            println!("{request:#?}");
        }
        Command::Response { slot } => {
            let bytes = fs::read(&slot)
                .with_context(|| format!("unable to read slot file {}", slot.display()))?;

            let (id, response) = Response::read(&bytes)?;
            println!("id = {id}");
            println!("{response:#?}");
        }
        Command::Attrs { dump, kind } => {
            let attrs = load_attrs(&dump)?;
            match kind {
                AttrKind::Ring => println!("{:#?}", RingInfo::from_pairs(&attrs)?),
                AttrKind::Disk => println!("{:#?}", DiskInfo::from_pairs(&attrs)?),
                AttrKind::Indirect => println!("{:#?}", FeatureIndirect::from_pairs(&attrs)?),
            }
        }
    }

    Ok(())
}

fn main() {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .init();

    if let Err(error) = run(opts) {
        tracing::error!(?error, "unable to run blkgate");
        std::process::exit(1);
    }
}
