use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::config::{Config, EtlSettings, StoreBackend, TablesConfig};
use super::data::memory_store::MemoryTableStore;
use super::data::rest_store::RestTableStore;
use super::data::schema::key_columns;
use super::data::sqlite_store::SqliteTableStore;
use super::data::TableStore;

/// Всё, что нужно загрузчикам: хранилища, имена таблиц, настройки и часы
///
/// Операционные и складские таблицы могут жить в разных хранилищах; по
/// умолчанию это одно и то же хранилище.
#[derive(Clone)]
pub struct EtlContext {
    pub operational: Arc<dyn TableStore>,
    pub warehouse: Arc<dyn TableStore>,
    pub tables: TablesConfig,
    pub settings: EtlSettings,
    pub clock: Arc<dyn Clock>,
}

impl EtlContext {
    /// Одно хранилище для обеих сторон
    pub fn new(
        store: Arc<dyn TableStore>,
        tables: TablesConfig,
        settings: EtlSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            operational: store.clone(),
            warehouse: store,
            tables,
            settings,
            clock,
        }
    }

    /// Собрать контекст по конфигурации
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn TableStore> = match config.store.backend {
            StoreBackend::Sqlite => {
                let path = super::config::get_database_path(config);
                tracing::info!("Using SQLite store at {}", path.display());
                Arc::new(SqliteTableStore::connect(&path, &config.tables).await?)
            }
            StoreBackend::Rest => {
                if config.store.rest_url.trim().is_empty() {
                    anyhow::bail!("REST store selected but rest_url / SUPABASE_URL is empty");
                }
                if config.store.rest_key.trim().is_empty() {
                    tracing::warn!("REST store without API key: requests will be anonymous");
                }
                tracing::info!("Using REST store at {}", config.store.rest_url);
                Arc::new(
                    RestTableStore::new(&config.store.rest_url, &config.store.rest_key)?
                        .with_order_keys(key_columns(&config.tables)),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store: nothing survives a restart");
                Arc::new(
                    MemoryTableStore::new().with_serial(&config.tables.dim_member, "member_key"),
                )
            }
        };

        Ok(Self::new(
            store,
            config.tables.clone(),
            config.etl.clone(),
            Arc::new(SystemClock),
        ))
    }
}
