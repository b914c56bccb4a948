//! # Persistencia de almuerzos
//!
//! [`LunchStore`] separa los handlers del backend concreto. En producción se
//! usa [`MongoRepo`](super::MongoRepo); en tests y desarrollo local,
//! [`MemoryStore`](super::MemoryStore).

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::models::{LunchReservation, Student};
use crate::api::{AppError, AppResult};
use crate::lunch::{MenuDay, ReservationDay, SaveDelta};

#[async_trait]
pub trait LunchStore: Send + Sync {
    /// Reservas de un alumno ordenadas por día
    async fn reservations_for(&self, email: &str) -> AppResult<Vec<LunchReservation>>;

    /// Todas las reservas de un día
    async fn reservations_on(&self, dia: ReservationDay) -> AppResult<Vec<LunchReservation>>;

    /// Menús publicados ordenados por día
    async fn menus(&self) -> AppResult<Vec<MenuDay>>;

    /// Crea o reemplaza el menú de un día
    async fn upsert_menu(&self, menu: MenuDay) -> AppResult<()>;

    async fn student(&self, email: &str) -> AppResult<Option<Student>>;

    /// Aplica los cambios de un guardado
    ///
    /// Añadir un día ya reservado no duplica la reserva; quitar un día no
    /// reservado no es un error.
    async fn apply_delta(&self, email: &str, turma: &str, delta: &SaveDelta) -> AppResult<()>;
}

/// Ejecuta una operación del store con límite de tiempo
///
/// # Errores
/// - `Timeout`: si la operación no termina a tiempo
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(operation)),
    }
}
