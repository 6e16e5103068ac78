use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTableResult {
    pub table: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Результат очистки таблиц хранилища
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetWarehouseResponse {
    pub tables: Vec<ResetTableResult>,
}

impl ResetWarehouseResponse {
    pub fn all_succeeded(&self) -> bool {
        self.tables.iter().all(|t| t.success)
    }
}
