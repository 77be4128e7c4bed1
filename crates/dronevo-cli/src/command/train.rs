use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use dronevo_training::{config::StrategyKind, evolution::EvolutionEngine};

use crate::{
    model::DroneModel,
    util::{self, Output, Preset},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration JSON file (takes precedence over --preset)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Built-in configuration (hover or gravity)
    #[arg(long, default_value = "hover")]
    preset: Preset,
    /// Reproduction strategy (roulette or speciated)
    #[arg(long)]
    strategy: Option<StrategyKind>,
    /// Number of agents per generation
    #[arg(long)]
    population: Option<usize>,
    /// Number of generations to train
    #[arg(long)]
    generations: Option<u32>,
    /// Random seed; drawn from entropy when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Simulate the agents of a tick in parallel
    #[arg(long)]
    parallel: bool,
    /// Write per-generation reports to this JSON file
    #[arg(long)]
    history: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        preset,
        strategy,
        population,
        generations,
        seed,
        parallel,
        history,
        output,
    } = arg;

    let mut config = util::load_training_config(config.as_deref(), *preset)?;
    let evolution = &mut config.evolution;
    if let Some(strategy) = strategy {
        evolution.strategy = *strategy;
    }
    if let Some(population) = population {
        evolution.population_size = *population;
    }
    if let Some(generations) = generations {
        evolution.generations = *generations;
    }
    if seed.is_some() {
        evolution.seed = *seed;
    }
    evolution.parallel |= *parallel;

    let mut engine = EvolutionEngine::new(config).context("Invalid training configuration")?;
    eprintln!(
        "Training {} agents for {} generations ({} strategy, seed {})",
        engine.config().evolution.population_size,
        engine.config().evolution.generations,
        engine.strategy_name(),
        engine.seed(),
    );

    while let Some(report) = engine.run_generation()? {
        let stats = &report.stats;
        let mut notes = String::new();
        if report.reseeded {
            notes.push_str(" (reseeded)");
        }
        if report.topped_up > 0 {
            notes.push_str(&format!(" ({} random genomes added)", report.topped_up));
        }
        eprintln!(
            "Generation #{}: best {}, mean {}, captures {}/{}, out of bounds {}, ticks {}{notes}",
            report.generation,
            format_fitness(report.best_fitness),
            format_fitness(report.mean_fitness),
            stats.captures,
            stats.agents,
            stats.out_of_bounds,
            stats.ticks,
        );
    }

    if let Some(path) = history {
        Output::save_json(&engine.history(), Some(path.clone()))?;
        eprintln!("History saved to {}", path.display());
    }

    let best = engine
        .best()
        .context("Training finished without scoring any genome")?;
    let training = engine.config();
    let model = DroneModel {
        name: format!("{}-{}", engine.strategy_name(), engine.seed()),
        trained_at: Utc::now(),
        final_fitness: best.fitness,
        generations: engine.generation(),
        seed: engine.seed(),
        strategy: training.evolution.strategy,
        layer_shape: training.controller.layer_shape.clone(),
        threshold: training.controller.threshold,
        simulation: training.simulation.clone(),
        genome: best.genome.clone(),
    };
    Output::save_json(&model, output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    eprintln!("  Name:          {}", model.name);
    eprintln!("  Generations:   {}", model.generations);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    if let Some(path) = output {
        eprintln!("  Output:        {}", path.display());
    }

    Ok(())
}

fn format_fitness(fitness: Option<f32>) -> String {
    fitness.map_or_else(|| "-".to_owned(), |f| format!("{f:.3}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fitness_of_empty_generation() {
        assert_eq!(format_fitness(Some(1.23456)), "1.235");
        assert_eq!(format_fitness(None), "-");
    }
}
