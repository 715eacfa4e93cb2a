use crate::config::{ServerConfig, StorageKind};
use crate::elo_client::EloClient;
use crate::error::StartupError;
use log::info;
use sadayizm_core::db::open_db;
use sadayizm_core::{
    JsonFileTrollRepository, MemoryTrollRepository, SqliteTrollRepository, TrollRepository,
    TrollService,
};
use std::sync::Arc;

pub type SharedService = TrollService<Box<dyn TrollRepository>>;

/// Process-wide handler state, built once at startup.
pub struct AppState {
    pub trolls: SharedService,
    pub elo: EloClient,
}

impl AppState {
    pub fn new(repo: Box<dyn TrollRepository>, elo: EloClient) -> Arc<Self> {
        Arc::new(Self {
            trolls: TrollService::new(repo),
            elo,
        })
    }

    /// Opens the configured store and the ELO client.
    pub fn from_config(config: &ServerConfig) -> Result<Arc<Self>, StartupError> {
        let repo = open_store(config)?;
        info!(
            "event=store_open module=server status=ok backend={} data_dir={}",
            repo.backend_name(),
            config.data_dir.display()
        );
        let elo = EloClient::new(config.elo.clone())?;
        Ok(Self::new(repo, elo))
    }
}

fn open_store(config: &ServerConfig) -> Result<Box<dyn TrollRepository>, StartupError> {
    let repo: Box<dyn TrollRepository> = match config.storage {
        StorageKind::Sqlite => {
            let conn = open_db(config.sqlite_path())?;
            Box::new(SqliteTrollRepository::try_new(conn)?)
        }
        StorageKind::Json => Box::new(JsonFileTrollRepository::new(config.json_path())),
        StorageKind::Memory => Box::new(MemoryTrollRepository::new()),
    };
    Ok(repo)
}
