//! # Ventana de reserva
//!
//! Solo se pueden marcar días laborables entre hoy y hoy + N días.

use chrono::{Duration, Local, NaiveDate};

use super::{ReservationDay, SelectionError};

/// Días reservables por defecto a partir de hoy
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    first: ReservationDay,
    last: ReservationDay,
}

impl BookingWindow {
    /// Ventana `[today, today + days]`, ambos extremos incluidos
    pub fn new(today: NaiveDate, days: u32) -> Self {
        let last = today
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            first: ReservationDay::new(today),
            last: ReservationDay::new(last),
        }
    }

    /// Ventana calculada con la fecha local actual
    pub fn starting_today(days: u32) -> Self {
        Self::new(Local::now().date_naive(), days)
    }

    pub fn first(&self) -> ReservationDay {
        self.first
    }

    pub fn last(&self) -> ReservationDay {
        self.last
    }

    /// Valida que un día se pueda marcar o desmarcar
    ///
    /// # Errores
    /// - `BeforeToday`: día anterior a hoy
    /// - `BeyondWindow`: día posterior al final de la ventana
    /// - `Weekend`: sábado o domingo
    pub fn check(&self, dia: ReservationDay) -> Result<(), SelectionError> {
        if dia < self.first {
            return Err(SelectionError::BeforeToday { dia });
        }
        if dia > self.last {
            return Err(SelectionError::BeyondWindow {
                dia,
                last: self.last,
            });
        }
        if dia.is_weekend() {
            return Err(SelectionError::Weekend { dia });
        }
        Ok(())
    }

    pub fn contains(&self, dia: ReservationDay) -> bool {
        self.check(dia).is_ok()
    }
}
