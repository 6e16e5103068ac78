use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::store::{Condition, Filter, Row, StoreError, TableStore};

/// Максимум строк, который PostgREST отдаёт за один запрос по умолчанию
const DEFAULT_PAGE_SIZE: usize = 1000;

/// HTTP-клиент к PostgREST (Supabase): `{url}/rest/v1/{table}`
///
/// Повторов нет: один вызов = один HTTP-запрос (для чтения: по запросу на страницу).
pub struct RestTableStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: usize,
    /// Таблица -> колонка, по которой упорядочиваются страницы
    order_keys: HashMap<String, String>,
}

impl RestTableStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            order_keys: HashMap::new(),
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_order_keys(mut self, order_keys: HashMap<String, String>) -> Self {
        self.order_keys = order_keys;
        self
    }

    /// Фильтр страницы: без сортировки Postgres не гарантирует порядок строк
    /// между запросами, поэтому по умолчанию сортируем по ключу таблицы
    fn paged_filter(&self, table: &str, filter: &Filter) -> Filter {
        let mut paged = filter.clone();
        if paged.order_by.is_none() {
            match self.order_keys.get(table) {
                Some(key) => paged.order_by = Some(key.clone()),
                None => tracing::warn!("REST read {}: no key column to order pages by", table),
            }
        }
        paged
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, urlencoding::encode(table))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    async fn check(table: &str, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Литерал значения для фильтра PostgREST
fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Строка запроса: фильтры, сортировка и (для чтения) страница
pub(crate) fn build_query(filter: &Filter, page: Option<(usize, usize)>) -> String {
    let mut parts = Vec::new();
    if page.is_some() {
        parts.push("select=*".to_string());
    }

    for condition in &filter.conditions {
        match condition {
            Condition::Eq(column, Value::Null) => {
                parts.push(format!("{}=is.null", urlencoding::encode(column)));
            }
            Condition::Eq(column, value) => parts.push(format!(
                "{}=eq.{}",
                urlencoding::encode(column),
                urlencoding::encode(&filter_literal(value))
            )),
            Condition::NotNull(column) => {
                parts.push(format!("{}=not.is.null", urlencoding::encode(column)));
            }
        }
    }

    if let Some(order) = &filter.order_by {
        parts.push(format!("order={}.asc", urlencoding::encode(order)));
    }

    if let Some((offset, limit)) = page {
        parts.push(format!("limit={}", limit));
        parts.push(format!("offset={}", offset));
    }

    parts.join("&")
}

fn with_query(url: String, query: &str) -> String {
    if query.is_empty() {
        url
    } else {
        format!("{}?{}", url, query)
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let filter = self.paged_filter(table, filter);
        let mut rows = Vec::new();
        let mut offset = 0;

        // Сервер может урезать страницу (db-max-rows), поэтому короткая
        // страница не означает конец таблицы: читаем до пустой.
        loop {
            let url = with_query(
                self.table_url(table),
                &build_query(&filter, Some((offset, self.page_size))),
            );
            let response = self.request(reqwest::Method::GET, &url).send().await?;
            let response = Self::check(table, response).await?;
            let page: Vec<Row> = response.json().await?;

            if page.is_empty() {
                break;
            }
            offset += page.len();
            rows.extend(page);
        }

        tracing::debug!("REST read {}: {} rows", table, rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, &self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }

    async fn update(&self, table: &str, key: &Filter, patch: Row) -> Result<(), StoreError> {
        let url = with_query(self.table_url(table), &build_query(key, None));
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreError> {
        let url = with_query(self.table_url(table), &build_query(filter, None));
        let response = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }
}
