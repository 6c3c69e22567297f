use env_logger::Builder;
use log::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Warn)
        .parse_default_env()
        .init();

    // realty-forms [new | <property-id>]
    let entity_id = match std::env::args().nth(1) {
        None => None,
        Some(arg) if arg == "new" => None,
        Some(id) => Some(id),
    };

    realty_forms::run_inspect(entity_id).await
}
