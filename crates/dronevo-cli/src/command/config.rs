use std::path::PathBuf;

use crate::util::{Output, Preset};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Built-in configuration to print (hover or gravity)
    #[arg(long, default_value = "hover")]
    preset: Preset,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    let ConfigArg { preset, output } = arg;
    let config = preset.training_config();
    config.validate()?;
    Output::save_json(&config, output.clone())
}
