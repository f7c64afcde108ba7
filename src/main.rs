use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tokio::net::TcpListener;

use weeksched::application::dashboard::DashboardService;
use weeksched::application::oauth::{OAuthConfig, OAuthManager};
use weeksched::application::reconciler::CalendarReconciler;
use weeksched::application::schedule_builder::ScheduleBuilder;
use weeksched::infrastructure::calendar_client::ReqwestCalendarClient;
use weeksched::infrastructure::config::{TokenStoreKind, ensure_default_config, load_config};
use weeksched::infrastructure::credential_store::{
    ConfiguredCredentialStore, FileCredentialStore, KeyringCredentialStore,
};
use weeksched::infrastructure::error::AppError;
use weeksched::infrastructure::oauth_client::ReqwestOAuthClient;
use weeksched::infrastructure::time::TimeZoneNormalizer;
use weeksched::server::{AppState, router};

const CONFIG_DIR_ENV: &str = "WEEKSCHED_CONFIG_DIR";

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(error) = run().await {
        log::error!("{error}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config_dir = std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    ensure_default_config(&config_dir)?;
    let config = load_config(&config_dir)?;
    let normalizer = TimeZoneNormalizer::new(&config.timezone)?;

    let credential_store = match config.token_store {
        TokenStoreKind::File => ConfiguredCredentialStore::File(FileCredentialStore::new(
            config_dir.join(&config.token_path),
        )),
        TokenStoreKind::Keyring => {
            ConfiguredCredentialStore::Keyring(KeyringCredentialStore::default())
        }
    };
    let oauth = OAuthManager::new(
        OAuthConfig::from_settings(&config.oauth),
        Arc::new(credential_store),
        Arc::new(ReqwestOAuthClient::new()),
    );

    if !oauth.token_status()?.token_stored {
        log::warn!(
            "no stored Google credential; authorize at {}",
            oauth.authorization_url("weeksched")?
        );
    }

    let calendar_client = Arc::new(ReqwestCalendarClient::new());
    let builder = ScheduleBuilder::new(normalizer);
    let reconciler = CalendarReconciler::new(Arc::clone(&calendar_client), normalizer.zone());
    let dashboard = DashboardService::new(
        Arc::clone(&calendar_client),
        normalizer,
        config.calendar_id.as_str(),
    );

    let addr: SocketAddr = config.listen_addr.parse().map_err(|error| {
        AppError::InvalidConfig(format!(
            "invalid listen address '{}': {error}",
            config.listen_addr
        ))
    })?;
    let backup_path = config_dir.join(&config.backup_path);

    let state = Arc::new(AppState {
        config,
        backup_path,
        oauth,
        builder,
        reconciler,
        dashboard,
    });

    let listener = TcpListener::bind(addr).await?;
    log::info!("dashboard listening at http://{addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
