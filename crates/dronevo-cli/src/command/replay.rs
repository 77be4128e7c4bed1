use std::{num::NonZeroU32, path::PathBuf};

use dronevo_engine::Environment;
use dronevo_training::{episode::Episode, population::Population};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use tracing::debug;

use crate::{model::DroneModel, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Trained model file
    #[arg(long)]
    model: PathBuf,
    /// Number of episodes to fly
    #[arg(long, default_value_t = 1)]
    episodes: u32,
    /// Random seed for target placement
    #[arg(long)]
    seed: Option<u64>,
    /// Move the target to a new random position every N ticks
    #[arg(long)]
    retarget_every: Option<NonZeroU32>,
    /// Write one JSON frame per tick to this file
    #[arg(long)]
    trace: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        model,
        episodes,
        seed,
        retarget_every,
        trace,
    } = arg;

    let model = DroneModel::open(model)?;
    // a genome the population would substitute is not this model
    let network = model.controller()?;
    let controller = model.controller_config();
    let simulation = &model.simulation;

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut trace = trace.clone().map(Output::open).transpose()?;

    eprintln!(
        "Replaying model {:?} ({} inputs, {:?} policy, seed {seed})",
        model.name,
        network.input_width(),
        network.policy(),
    );
    let mut total_captures = 0;
    for index in 0..*episodes {
        let environment = Environment::with_random_target(simulation.environment.clone(), &mut rng);
        let population = Population::spawn(
            vec![model.genome.clone()],
            &controller,
            &environment,
            &mut rng,
        );
        let mut episode = Episode::new(index, population, environment, simulation);

        if let Some(trace) = &mut trace {
            trace.write_json_line(&episode.snapshot())?;
        }
        while episode.step().is_some() {
            let tick = episode.clock().tick();
            if let Some(every) = retarget_every
                && tick % every.get() == 0
                && !episode.is_finished()
            {
                episode.environment_mut().respawn_target(&mut rng);
                let target = episode.environment().target().position;
                debug!(episode = index, tick, x = target.x, y = target.y, "target respawned");
            }
            if let Some(trace) = &mut trace {
                trace.write_json_line(&episode.snapshot())?;
            }
        }

        let stats = episode.stats();
        total_captures += stats.captures;
        let agent = episode.snapshot().agents.into_iter().next();
        match agent {
            Some(agent) => eprintln!(
                "Episode #{index}: {:?} after {} ticks, fitness {:.3}",
                agent.status, stats.ticks, agent.fitness,
            ),
            None => eprintln!("Episode #{index}: no agent"),
        }
    }

    if let Some(mut trace) = trace {
        std::io::Write::flush(&mut trace)?;
        eprintln!("Trace saved to {}", trace.display_path());
    }
    eprintln!("Captured {total_captures} of {episodes} targets");
    Ok(())
}
