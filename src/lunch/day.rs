//! # Día de reserva
//!
//! Un día de almuerzo se identifica por su fecha ISO `YYYY-MM-DD`. Dos días
//! son iguales si su cadena ISO es igual; nunca se comparan instantes.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SelectionError;

/// Formato canónico de un día de reserva
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Fecha de almuerzo normalizada a medianoche
///
/// El orden de `NaiveDate` coincide con el orden lexicográfico de la cadena
/// ISO, así que ordenar días equivale a ordenar sus cadenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReservationDay(NaiveDate);

impl ReservationDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parsea una fecha estricta `YYYY-MM-DD`
    ///
    /// # Errores
    /// - `InvalidDay`: si la cadena no es una fecha ISO válida
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let trimmed = raw.trim();
        // chrono acepta "2024-5-1"; la clave canónica exige ceros a la izquierda
        if trimmed.len() != 10 {
            return Err(SelectionError::InvalidDay(raw.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
            .map(Self)
            .map_err(|_| SelectionError::InvalidDay(raw.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Sábado o domingo
    pub fn is_weekend(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn iso(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }
}

impl fmt::Display for ReservationDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl FromStr for ReservationDay {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReservationDay {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReservationDay> for String {
    fn from(day: ReservationDay) -> Self {
        day.iso()
    }
}

impl From<NaiveDate> for ReservationDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
