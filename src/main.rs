use anyhow::Context;
use doorway::ViewerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from_env();
    log::info!("Loading assets from {}", config.asset_root.display());

    doorway::run(config).context("viewer stopped with an error")
}
