//! Store en memoria para tests y desarrollo local.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::models::{current_timestamp, LunchReservation, Student};
use super::store::LunchStore;
use crate::api::{AppError, AppResult};
use crate::lunch::{MenuDay, ReservationDay, SaveDelta};

type ReservationKey = (String, ReservationDay);

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    reservations: Arc<RwLock<BTreeMap<ReservationKey, LunchReservation>>>,
    menus: Arc<RwLock<BTreeMap<ReservationDay, MenuDay>>>,
    students: Arc<RwLock<HashMap<String, Student>>>,
    fail_writes: Arc<AtomicBool>,
    write_delay_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_student(&self, email: &str, nome: &str, turma: &str) {
        self.students.write().await.insert(
            email.to_string(),
            Student {
                id: None,
                email: email.to_string(),
                nome: nome.to_string(),
                turma: turma.to_string(),
            },
        );
    }

    /// Simula una caída del backend en los guardados
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Simula un backend lento en los guardados
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl LunchStore for MemoryStore {
    async fn reservations_for(&self, email: &str) -> AppResult<Vec<LunchReservation>> {
        // BTreeMap ordenado por (email, dia)
        Ok(self
            .reservations
            .read()
            .await
            .iter()
            .filter(|((owner, _), _)| owner == email)
            .map(|(_, reservation)| reservation.clone())
            .collect())
    }

    async fn reservations_on(&self, dia: ReservationDay) -> AppResult<Vec<LunchReservation>> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .filter(|reservation| reservation.dia == dia)
            .cloned()
            .collect())
    }

    async fn menus(&self) -> AppResult<Vec<MenuDay>> {
        Ok(self.menus.read().await.values().cloned().collect())
    }

    async fn upsert_menu(&self, menu: MenuDay) -> AppResult<()> {
        self.menus.write().await.insert(menu.dia, menu);
        Ok(())
    }

    async fn student(&self, email: &str) -> AppResult<Option<Student>> {
        Ok(self.students.read().await.get(email).cloned())
    }

    async fn apply_delta(&self, email: &str, turma: &str, delta: &SaveDelta) -> AppResult<()> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal_trace("escritura deshabilitada", None));
        }

        let mut reservations = self.reservations.write().await;
        for dia in &delta.to_remove {
            reservations.remove(&(email.to_string(), *dia));
        }
        let created_at = current_timestamp();
        for dia in &delta.to_add {
            reservations
                .entry((email.to_string(), *dia))
                .or_insert_with(|| LunchReservation {
                    id: None,
                    email: email.to_string(),
                    dia: *dia,
                    turma: turma.to_string(),
                    created_at,
                });
        }
        Ok(())
    }
}
