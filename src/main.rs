use foodgram::{routes, Config, State};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let state = State::new(&config).await?;

    log::info!("Listening on {}", config.bind_address);
    warp::serve(routes::api(state))
        .run(config.bind_address)
        .await;

    Ok(())
}
