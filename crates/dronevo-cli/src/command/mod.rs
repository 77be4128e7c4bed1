use clap::{Parser, Subcommand};

use self::{config::ConfigArg, fly::FlyArg, replay::ReplayArg, train::TrainArg};

mod config;
mod fly;
mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve drone controllers and save the best one
    Train(#[clap(flatten)] TrainArg),
    /// Fly a trained model against fresh targets
    Replay(#[clap(flatten)] ReplayArg),
    /// Print a training configuration as JSON
    Config(#[clap(flatten)] ConfigArg),
    /// Fly a single drone through a scripted command sequence
    Fly(#[clap(flatten)] FlyArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
        Mode::Fly(arg) => fly::run(&arg)?,
    }
    Ok(())
}
