use anyhow::Result;
use kgate_config::GateConfig;

pub fn show(config: &GateConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
