use firefly::TrailEffect;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = TrailEffect::new().run() {
        log::error!("firefly failed to start: {}", e);
        std::process::exit(1);
    }
}
