use clap::Parser;
use log::{error, info};
use simple_error::{try_with, SimpleResult};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use gridgrowth::network::Network;
use gridgrowth::params;
use gridgrowth::strategy;

/// Grows the connectivity of a grid of LIF neurons towards a target firing rate
#[derive(Parser, Debug)]
#[command(name = "gridgrowth", version, about, long_about = None)]
struct Args {
    /// Parameter file, YAML or JSON by extension
    params: PathBuf,

    /// Output file for the XML state document
    state_out: PathBuf,

    /// Binary checkpoint to resume from
    #[arg(long)]
    read_checkpoint: Option<PathBuf>,

    /// Binary checkpoint to write after the run
    #[arg(long)]
    write_checkpoint: Option<PathBuf>,
}

fn run(args: &Args) -> SimpleResult<()> {
    let params = params::load_network_params(&args.params)?;
    let mut network = Network::new(params.clone())?;

    if let Some(path) = &args.read_checkpoint {
        let file = try_with!(File::open(path), "cannot open {}", path.display());
        network.restore_from_checkpoint(&mut BufReader::new(file))?;
        info!("resuming from {}", path.display());
    }

    let mut strategy = strategy::create_strategy(&params.technical_params);
    network.run(strategy.as_mut())?;

    let file = try_with!(
        File::create(&args.state_out),
        "cannot create {}",
        args.state_out.display()
    );
    network.save_state(&mut BufWriter::new(file))?;
    info!("state written to {}", args.state_out.display());

    if let Some(path) = &args.write_checkpoint {
        let file = try_with!(File::create(path), "cannot create {}", path.display());
        network.write_checkpoint(&mut BufWriter::new(file))?;
    }

    network.terminate(strategy);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
