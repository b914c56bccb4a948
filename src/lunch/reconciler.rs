//! # Reconciliación de la selección de almuerzos
//!
//! Mantiene tres conjuntos de días:
//!
//! - reservas conocidas por el servidor
//! - días añadidos localmente y aún no guardados
//! - días del servidor marcados para quitar y aún no guardados
//!
//! La selección visible es `(servidor − quitar) ∪ añadir`. Todas las
//! operaciones son puras; la persistencia la hace quien posee el reconciliador.

use serde::Serialize;
use std::collections::BTreeSet;

use super::{BookingWindow, MenuByDay, MenuDay, ReservationDay, SelectionError};

pub type DaySet = BTreeSet<ReservationDay>;

/// Estado de una celda del calendario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    Unreserved,
    PendingAdd,
    ServerReserved,
    PendingRemove,
}

/// Cambios a enviar al guardar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveDelta {
    #[serde(rename = "diasParaAdicionar")]
    pub to_add: Vec<ReservationDay>,
    #[serde(rename = "diasParaRemover")]
    pub to_remove: Vec<ReservationDay>,
}

impl SaveDelta {
    /// Sin cambios: no se debe enviar nada al servidor
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Alterna un día entre reservado y no reservado
///
/// Las ramas se evalúan en orden:
/// 1. en el servidor y no marcado para quitar: se marca para quitar
/// 2. añadido localmente: se deshace el añadido
/// 3. marcado para quitar: se restaura la reserva del servidor
/// 4. en ningún conjunto: se añade localmente
///
/// 1 y 2 pueden aplicarse en la misma llamada si el día está en el servidor
/// y en los añadidos a la vez.
pub fn toggle_day(
    dia: ReservationDay,
    server: &DaySet,
    add: &DaySet,
    remove: &DaySet,
) -> (DaySet, DaySet) {
    let mut add = add.clone();
    let mut remove = remove.clone();
    let mut handled = false;

    if server.contains(&dia) && !remove.contains(&dia) {
        remove.insert(dia);
        handled = true;
    }
    if add.remove(&dia) {
        handled = true;
    }
    if !handled && !remove.remove(&dia) {
        add.insert(dia);
    }

    (add, remove)
}

/// `(servidor − quitar) ∪ añadir`, ordenado por fecha
pub fn effective_selection(server: &DaySet, add: &DaySet, remove: &DaySet) -> DaySet {
    server
        .difference(remove)
        .chain(add.iter())
        .copied()
        .collect()
}

/// Listas de días a añadir y a quitar
///
/// Un día presente en ambos conjuntos se cancela: no se envía en ninguna lista.
pub fn compute_save_delta(add: &DaySet, remove: &DaySet) -> SaveDelta {
    SaveDelta {
        to_add: add.difference(remove).copied().collect(),
        to_remove: remove.difference(add).copied().collect(),
    }
}

/// Menú del día, si existe
pub fn resolve_menu_overlay(dia: ReservationDay, menus: &MenuByDay) -> Option<&MenuDay> {
    menus.get(&dia)
}

/// Estado de un día según los tres conjuntos
pub fn day_state(dia: ReservationDay, server: &DaySet, add: &DaySet, remove: &DaySet) -> DayState {
    if add.contains(&dia) {
        DayState::PendingAdd
    } else if remove.contains(&dia) {
        DayState::PendingRemove
    } else if server.contains(&dia) {
        DayState::ServerReserved
    } else {
        DayState::Unreserved
    }
}

/// Selección de almuerzos de un usuario durante una sesión
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LunchSelectionReconciler {
    server: DaySet,
    pending_add: DaySet,
    pending_remove: DaySet,
}

impl LunchSelectionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = ReservationDay>,
    {
        Self {
            server: days.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn server_days(&self) -> &DaySet {
        &self.server
    }

    pub fn pending_add(&self) -> &DaySet {
        &self.pending_add
    }

    pub fn pending_remove(&self) -> &DaySet {
        &self.pending_remove
    }

    /// Valida el día contra la ventana y lo alterna
    ///
    /// # Errores
    /// Si el día no es reservable los conjuntos no cambian.
    pub fn toggle(
        &mut self,
        dia: ReservationDay,
        window: &BookingWindow,
    ) -> Result<DayState, SelectionError> {
        window.check(dia)?;
        let (add, remove) = toggle_day(dia, &self.server, &self.pending_add, &self.pending_remove);
        self.pending_add = add;
        self.pending_remove = remove;
        Ok(self.state_of(dia))
    }

    pub fn state_of(&self, dia: ReservationDay) -> DayState {
        day_state(dia, &self.server, &self.pending_add, &self.pending_remove)
    }

    pub fn effective_selection(&self) -> DaySet {
        effective_selection(&self.server, &self.pending_add, &self.pending_remove)
    }

    pub fn save_delta(&self) -> SaveDelta {
        compute_save_delta(&self.pending_add, &self.pending_remove)
    }

    pub fn has_changes(&self) -> bool {
        !self.save_delta().is_empty()
    }

    /// Reemplaza las reservas del servidor tras una consulta
    ///
    /// Los cambios pendientes se conservan salvo los que ya no tienen sentido:
    /// añadidos que el servidor ya tiene y quitados que el servidor ya no tiene.
    pub fn refresh<I>(&mut self, server_days: I)
    where
        I: IntoIterator<Item = ReservationDay>,
    {
        self.server = server_days.into_iter().collect();
        let server = &self.server;
        self.pending_add.retain(|dia| !server.contains(dia));
        self.pending_remove.retain(|dia| server.contains(dia));
    }

    /// Descarta los cambios locales
    pub fn discard(&mut self) {
        self.pending_add.clear();
        self.pending_remove.clear();
    }

    /// Consolida los cambios tras un guardado correcto
    pub fn mark_saved(&mut self) {
        self.server = self.effective_selection();
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunch::menu::index_by_day;
    use chrono::NaiveDate;

    fn day(raw: &str) -> ReservationDay {
        ReservationDay::parse(raw).unwrap()
    }

    fn set(days: &[&str]) -> DaySet {
        days.iter().map(|d| day(d)).collect()
    }

    // lunes 2024-05-06, ventana hasta 2024-06-05
    fn window() -> BookingWindow {
        BookingWindow::new(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(), 30)
    }

    #[test]
    fn toggling_server_day_marks_it_for_removal() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10")]);

        let state = r.toggle(day("2024-05-10"), &window()).unwrap();

        assert_eq!(state, DayState::PendingRemove);
        assert_eq!(r.pending_remove(), &set(&["2024-05-10"]));
        assert!(!r.effective_selection().contains(&day("2024-05-10")));
    }

    #[test]
    fn toggling_again_restores_server_day() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10")]);
        r.toggle(day("2024-05-10"), &window()).unwrap();

        let state = r.toggle(day("2024-05-10"), &window()).unwrap();

        assert_eq!(state, DayState::ServerReserved);
        assert!(r.pending_remove().is_empty());
        assert!(r.effective_selection().contains(&day("2024-05-10")));
    }

    #[test]
    fn toggling_saturday_is_rejected_without_changes() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10")]);
        let before = r.clone();

        let err = r.toggle(day("2024-05-11"), &window()).unwrap_err();

        assert_eq!(err, SelectionError::Weekend { dia: day("2024-05-11") });
        assert_eq!(r, before);
    }

    #[test]
    fn toggling_outside_window_is_rejected() {
        let mut r = LunchSelectionReconciler::new();
        assert!(r.toggle(day("2024-05-03"), &window()).is_err());
        assert!(r.toggle(day("2024-06-10"), &window()).is_err());
        assert!(!r.has_changes());
    }

    #[test]
    fn new_day_goes_to_pending_add_and_back() {
        let mut r = LunchSelectionReconciler::new();

        assert_eq!(r.toggle(day("2024-05-15"), &window()).unwrap(), DayState::PendingAdd);
        assert_eq!(r.toggle(day("2024-05-15"), &window()).unwrap(), DayState::Unreserved);
        assert_eq!(r, LunchSelectionReconciler::new());
    }

    #[test]
    fn toggle_twice_is_identity_for_every_state() {
        let server = set(&["2024-05-07", "2024-05-08"]);
        let add = set(&["2024-05-09"]);
        let remove = set(&["2024-05-08"]);

        for raw in ["2024-05-07", "2024-05-08", "2024-05-09", "2024-05-10"] {
            let (a1, r1) = toggle_day(day(raw), &server, &add, &remove);
            let (a2, r2) = toggle_day(day(raw), &server, &a1, &r1);
            assert_eq!((a2, r2), (add.clone(), remove.clone()), "día {raw}");
        }
    }

    #[test]
    fn day_in_server_and_add_applies_both_branches() {
        let server = set(&["2024-05-07"]);
        let add = set(&["2024-05-07"]);

        let (a, r) = toggle_day(day("2024-05-07"), &server, &add, &DaySet::new());

        assert!(a.is_empty());
        assert_eq!(r, set(&["2024-05-07"]));
    }

    #[test]
    fn effective_selection_is_sorted_and_stable() {
        let server = set(&["2024-05-20", "2024-05-08", "2024-05-09"]);
        let add = set(&["2024-05-07"]);
        let remove = set(&["2024-05-09"]);

        let first = effective_selection(&server, &add, &remove);
        let second = effective_selection(&server, &add, &remove);

        assert_eq!(first, second);
        let ordered: Vec<String> = first.iter().map(|d| d.iso()).collect();
        assert_eq!(ordered, vec!["2024-05-07", "2024-05-08", "2024-05-20"]);
    }

    #[test]
    fn save_delta_lists_pending_days() {
        let delta = compute_save_delta(&set(&["2024-05-15"]), &DaySet::new());
        assert_eq!(
            delta,
            SaveDelta {
                to_add: vec![day("2024-05-15")],
                to_remove: vec![],
            }
        );
        assert!(!delta.is_empty());
    }

    #[test]
    fn save_delta_never_overlaps() {
        let add = set(&["2024-05-15", "2024-05-16"]);
        let remove = set(&["2024-05-16", "2024-05-17"]);

        let delta = compute_save_delta(&add, &remove);

        assert_eq!(delta.to_add, vec![day("2024-05-15")]);
        assert_eq!(delta.to_remove, vec![day("2024-05-17")]);
    }

    #[test]
    fn empty_delta_means_no_changes() {
        assert!(LunchSelectionReconciler::new().save_delta().is_empty());
    }

    #[test]
    fn delta_serializes_with_wire_names() {
        let delta = compute_save_delta(&set(&["2024-05-15"]), &set(&["2024-05-10"]));
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "diasParaAdicionar": ["2024-05-15"],
                "diasParaRemover": ["2024-05-10"]
            })
        );
    }

    #[test]
    fn refresh_prunes_stale_pending_days() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10"), day("2024-05-13")]);
        r.toggle(day("2024-05-10"), &window()).unwrap();
        r.toggle(day("2024-05-14"), &window()).unwrap();
        r.toggle(day("2024-05-15"), &window()).unwrap();

        // el servidor ya no tiene el 10 y ya tiene el 14
        r.refresh([day("2024-05-13"), day("2024-05-14")]);

        assert!(r.pending_remove().is_empty());
        assert_eq!(r.pending_add(), &set(&["2024-05-15"]));
        assert_eq!(
            r.effective_selection(),
            set(&["2024-05-13", "2024-05-14", "2024-05-15"])
        );
    }

    #[test]
    fn mark_saved_consolidates_selection() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10")]);
        r.toggle(day("2024-05-10"), &window()).unwrap();
        r.toggle(day("2024-05-15"), &window()).unwrap();

        r.mark_saved();

        assert_eq!(r.server_days(), &set(&["2024-05-15"]));
        assert!(!r.has_changes());
        assert_eq!(r.state_of(day("2024-05-15")), DayState::ServerReserved);
        assert_eq!(r.state_of(day("2024-05-10")), DayState::Unreserved);
    }

    #[test]
    fn discard_keeps_server_days() {
        let mut r = LunchSelectionReconciler::with_server_days([day("2024-05-10")]);
        r.toggle(day("2024-05-10"), &window()).unwrap();
        r.toggle(day("2024-05-15"), &window()).unwrap();

        r.discard();

        assert_eq!(r, LunchSelectionReconciler::with_server_days([day("2024-05-10")]));
    }

    #[test]
    fn menu_overlay_ignores_reservation_state() {
        let menus = index_by_day([MenuDay {
            dia: day("2024-05-10"),
            sopa: "Sopa de legumes".to_string(),
            prato_principal: "Frango assado".to_string(),
            sobremesa: "Fruta".to_string(),
        }]);

        assert_eq!(
            resolve_menu_overlay(day("2024-05-10"), &menus).map(|m| m.sopa.as_str()),
            Some("Sopa de legumes")
        );
        assert!(resolve_menu_overlay(day("2024-05-13"), &menus).is_none());
    }
}
