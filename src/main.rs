use tracing::{error, Level};

use karmalend::{
    configuration::{
        get_configuration, set_configuration, AppState, Config, State,
    },
    error::Error,
    handler::snapshot_refresh_task,
    provider::{load_contract_address, ChainClient, ScoringApi},
    server,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}

async fn app_main() -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(Level::INFO)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match init() {
        Ok(config) => config,
        Err(e) => return Err(Error::ConfigurationError(e.to_string())),
    };

    let contract_address =
        load_contract_address(&config.abis_dir, &config.network)?;
    let chain = ChainClient::new(
        &config.rpc_host,
        &config.signer_key,
        contract_address,
    )?;
    let scoring = ScoringApi::new(
        config.scoring_host.to_owned(),
        config.gateway_host.to_owned(),
        config.network.to_owned(),
        config.timeout,
    )?;

    let state = State::new(config, chain, scoring)?;
    let app_state = AppState::new(state);

    let (_, _) = tokio::try_join!(
        server::server_task(&app_state),
        snapshot_refresh_task(app_state.clone()),
    )?;

    Ok(())
}

fn init() -> Result<Config, Error> {
    set_configuration()?;
    get_configuration()
}
