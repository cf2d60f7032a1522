//! Shared test helpers: a scriptable in-memory remote store

#![allow(dead_code)]

use async_trait::async_trait;
use rdc_catalog::store::{Filter, Order, RemoteStore, Row, StoreError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory table with switchable failure modes
pub struct ScriptedStore {
    rows: Mutex<Vec<Row>>,
    next_id: AtomicU64,
    has_gallery_column: bool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    select_delay: Option<Duration>,
    write_delay: Option<Duration>,
    empty_insert_result: bool,
    selects_in_flight: AtomicUsize,
    max_selects_in_flight: AtomicUsize,
    inserted: Mutex<Vec<Row>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
            has_gallery_column: true,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            select_delay: None,
            write_delay: None,
            empty_insert_result: false,
            selects_in_flight: AtomicUsize::new(0),
            max_selects_in_flight: AtomicUsize::new(0),
            inserted: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Table created before the gallery feature existed
    pub fn without_gallery_column(mut self) -> Self {
        self.has_gallery_column = false;
        self
    }

    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        {
            let mut stored = self.rows.lock().unwrap();
            for row in rows {
                stored.push(row.as_object().cloned().unwrap());
            }
        }
        self
    }

    pub fn with_select_delay(mut self, delay: Duration) -> Self {
        self.select_delay = Some(delay);
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Accept inserts but answer with no representation
    pub fn with_empty_insert_result(mut self) -> Self {
        self.empty_insert_result = true;
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every insert payload received, including rejected ones
    pub fn inserted_payloads(&self) -> Vec<Row> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn max_selects_in_flight(&self) -> usize {
        self.max_selects_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self, row: &Row) -> Result<(), StoreError> {
        if !self.has_gallery_column && row.contains_key("fotos") {
            return Err(StoreError::missing_column(
                Some("fotos".to_string()),
                "Could not find the 'fotos' column of 'clinicas' in the schema cache",
            ));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::rejected(
                500,
                None,
                "connection reset by peer",
            ));
        }
        Ok(())
    }

    async fn write_pause(&self) {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn id_of(row: &Row) -> i64 {
    match row.get("id") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn select(
        &self,
        _table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        self.record("select");

        let now = self.selects_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_selects_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.select_delay {
            tokio::time::sleep(delay).await;
        }
        self.selects_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("error sending request: dns error"));
        }

        let mut rows: Vec<Row> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = order {
            rows.sort_by_key(id_of);
            if !order.ascending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(&self, _table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        self.record("insert");
        self.inserted.lock().unwrap().extend(rows.iter().cloned());
        self.write_pause().await;

        for row in &rows {
            self.check_write(row)?;
        }

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            row.insert("id".to_string(), json!(id));
            stored.push(row);
        }
        self.rows.lock().unwrap().extend(stored.iter().cloned());
        if self.empty_insert_result {
            return Ok(Vec::new());
        }
        Ok(stored)
    }

    async fn update(
        &self,
        _table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError> {
        self.record("update");
        self.write_pause().await;
        self.check_write(&patch)?;

        let mut affected = Vec::new();
        for row in self.rows.lock().unwrap().iter_mut() {
            if filters.iter().all(|f| f.matches(row)) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                affected.push(row.clone());
            }
        }
        Ok(affected)
    }

    async fn delete(&self, _table: &str, filters: &[Filter]) -> Result<(), StoreError> {
        self.record("delete");
        self.write_pause().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::rejected(
                403,
                Some("42501".to_string()),
                "permission denied for table clinicas",
            ));
        }
        self.rows
            .lock()
            .unwrap()
            .retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(())
    }
}

/// A listings row as written by the current app
pub fn listing_row(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "nome": name,
        "localizacao": "São Paulo, SP",
        "preco": 150000.0,
        "faturamento_mensal": 20000.0,
        "descricao": "Clínica montada",
        "imagem": format!("https://img.example/{}-0.jpg", id),
        "fotos": [
            format!("https://img.example/{}-0.jpg", id),
            format!("https://img.example/{}-1.jpg", id)
        ],
        "especialidades": ["Odontologia"]
    })
}
