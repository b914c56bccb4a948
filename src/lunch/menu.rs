//! # Menú de la cantina

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ReservationDay;

/// Menú planificado para un día, independiente de las reservas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDay {
    pub dia: ReservationDay,
    pub sopa: String,
    pub prato_principal: String,
    pub sobremesa: String,
}

/// Menús indexados por día
pub type MenuByDay = BTreeMap<ReservationDay, MenuDay>;

/// Indexa una lista de menús; si un día se repite gana el último
pub fn index_by_day<I>(menus: I) -> MenuByDay
where
    I: IntoIterator<Item = MenuDay>,
{
    menus.into_iter().map(|menu| (menu.dia, menu)).collect()
}
