use thiserror::Error;

use super::data::StoreError;

/// Ошибка, прерывающая загрузчик целиком
///
/// Ошибки отдельных записей загрузчик не возвращает: они считаются в
/// `LoadStats::failed` и пишутся в лог.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Failed to read {table}: {source}")]
    Read {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid date window: {0}")]
    InvalidWindow(String),
}

impl EtlError {
    pub fn read(table: &str, source: StoreError) -> Self {
        EtlError::Read {
            table: table.to_string(),
            source,
        }
    }
}
