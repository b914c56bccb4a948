//! # Módulo de almuerzos
//!
//! Lógica pura de la selección de días de almuerzo:
//!
//! - [`day`] - Día de reserva con clave ISO canónica
//! - [`window`] - Ventana de días reservables
//! - [`menu`] - Menú de la cantina por día
//! - [`reconciler`] - Reconciliación entre reservas del servidor y cambios locales

pub mod day;
pub mod menu;
pub mod reconciler;
pub mod window;

pub use day::ReservationDay;
pub use menu::{MenuByDay, MenuDay};
pub use reconciler::{DayState, LunchSelectionReconciler, SaveDelta};
pub use window::BookingWindow;

use thiserror::Error;

/// Rechazos de validación previos a cualquier cambio en la selección
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Fecha inválida '{0}', use YYYY-MM-DD")]
    InvalidDay(String),

    #[error("El día {dia} ya pasó")]
    BeforeToday { dia: ReservationDay },

    #[error("El día {dia} está fuera del periodo de reserva (hasta {last})")]
    BeyondWindow {
        dia: ReservationDay,
        last: ReservationDay,
    },

    #[error("El día {dia} es fin de semana, no hay almuerzo")]
    Weekend { dia: ReservationDay },
}
