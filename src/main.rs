use spinsphere::{AppConfig, run_with_config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    log::info!(
        "Sphere r={} with {} sectors x {} stacks",
        config.sphere.radius,
        config.sphere.sectors,
        config.sphere.stacks
    );

    if let Err(err) = run_with_config(config) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
