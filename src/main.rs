use playground::AppConfig;

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,playground=info"),
    )
    .init();

    if let Err(e) = playground::run_with_config(AppConfig::default()) {
        log::error!("Event loop failed: {}", e);
        std::process::exit(1);
    }
}
