use anyhow::{Context, bail};
use dronevo_controller::manual::{KeyCommand, ManualController};
use dronevo_engine::{AgentState, ControlInput, Controller as _, DroneBody, Environment, Vec2};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::util::Preset;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct FlyArg {
    /// Commands to apply one per tick, e.g. "u*5 ur . l*3"
    ///
    /// Each token is a key string (u, d, l, r or . for idle), optionally
    /// followed by `*N` to repeat it N times. Tokens are separated by
    /// whitespace or commas.
    #[arg(long)]
    script: String,
    /// Built-in configuration (hover or gravity)
    #[arg(long, default_value = "hover")]
    preset: Preset,
    /// Target x coordinate; random when omitted
    #[arg(long, requires = "target_y")]
    target_x: Option<f32>,
    /// Target y coordinate; random when omitted
    #[arg(long, requires = "target_x")]
    target_y: Option<f32>,
    /// Random seed for target placement
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &FlyArg) -> anyhow::Result<()> {
    let FlyArg {
        script,
        preset,
        target_x,
        target_y,
        seed,
    } = arg;

    let commands = parse_script(script)?;
    let simulation = preset.training_config().simulation;
    let environment = match (target_x, target_y) {
        (Some(x), Some(y)) => Environment::new(simulation.environment.clone(), Vec2::new(*x, *y)),
        _ => {
            let mut rng = Pcg32::seed_from_u64(seed.unwrap_or_else(rand::random));
            Environment::with_random_target(simulation.environment.clone(), &mut rng)
        }
    };

    let body = DroneBody::at_rest(environment.config().spawn_point());
    let mut state = AgentState::spawn(body, environment.distance(&body));
    let mut controller = ManualController::default();

    let target = environment.target().position;
    println!("target ({:.1}, {:.1})", target.x, target.y);
    for (tick, command) in commands.into_iter().enumerate() {
        if !state.status.is_active() {
            break;
        }
        controller.set_command(command);
        let input = controller.act(&environment.observe(&state.body));
        state = environment.advance(&state, input, &simulation.physics);
        println!(
            "{:4} {:<6} pos ({:7.1}, {:7.1}) vel ({:5.2}, {:5.2}) dist {:7.1} fitness {:7.3} {:?}",
            tick + 1,
            format_command(input),
            state.body.position.x,
            state.body.position.y,
            state.body.velocity.x,
            state.body.velocity.y,
            state.previous_distance,
            state.fitness,
            state.status,
        );
    }
    Ok(())
}

/// Expands a script such as `"u*3, ur ."` into one command per tick.
fn parse_script(script: &str) -> anyhow::Result<Vec<ControlInput>> {
    let mut commands = vec![];
    for token in script
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        let (keys, repeat) = match token.split_once('*') {
            Some((keys, count)) => {
                let count = count
                    .parse::<usize>()
                    .with_context(|| format!("Invalid repeat count in {token:?}"))?;
                (keys, count)
            }
            None => (token, 1),
        };
        if keys.is_empty() {
            bail!("Missing keys in {token:?}");
        }
        let KeyCommand(command) = keys.parse()?;
        commands.extend(std::iter::repeat_n(command, repeat));
    }
    Ok(commands)
}

fn format_command(input: ControlInput) -> String {
    let vertical = if input.vertical.is_up() {
        "u"
    } else if input.vertical.is_down() {
        "d"
    } else {
        ""
    };
    let horizontal = if input.horizontal.is_left() {
        "l"
    } else if input.horizontal.is_right() {
        "r"
    } else {
        ""
    };
    let keys = format!("{vertical}{horizontal}");
    if keys.is_empty() { ".".to_owned() } else { keys }
}

#[cfg(test)]
mod tests {
    use dronevo_engine::{Horizontal, Vertical};

    use super::*;

    #[test]
    fn test_parse_script_expands_repeats() {
        let commands = parse_script("u*2, ur .").unwrap();
        assert_eq!(
            commands,
            vec![
                ControlInput::new(Vertical::Up, Horizontal::Idle),
                ControlInput::new(Vertical::Up, Horizontal::Idle),
                ControlInput::new(Vertical::Up, Horizontal::Right),
                ControlInput::IDLE,
            ]
        );
    }

    #[test]
    fn test_parse_script_rejects_bad_tokens() {
        assert!(parse_script("ud").is_err());
        assert!(parse_script("x").is_err());
        assert!(parse_script("u*many").is_err());
        assert!(parse_script("*3").is_err());
    }

    #[test]
    fn test_empty_script_is_no_commands() {
        assert!(parse_script(" ,, ").unwrap().is_empty());
    }

    #[test]
    fn test_format_command() {
        assert_eq!(format_command(ControlInput::IDLE), ".");
        assert_eq!(
            format_command(ControlInput::new(Vertical::Down, Horizontal::Left)),
            "dl"
        );
    }
}
