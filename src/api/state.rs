//! Estado compartido entre workers de Actix.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::LunchStore;
use crate::lunch::{BookingWindow, LunchSelectionReconciler, MenuByDay};

/// Selección en curso de un alumno y los menús vistos en la última consulta
#[derive(Debug, Default)]
pub struct SelectionSession {
    pub reconciler: LunchSelectionReconciler,
    pub menus: MenuByDay,
    /// Reservas y menús ya consultados al menos una vez
    pub loaded: bool,
}

/// El mutex asíncrono se mantiene durante toda una consulta o guardado, así
/// que las operaciones de un mismo alumno se ejecutan en cola.
pub type SharedSession = Arc<Mutex<SelectionSession>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LunchStore>,
    pub config: Config,
    sessions: Arc<StdMutex<HashMap<String, SharedSession>>>,
}

impl AppState {
    pub fn new<S>(store: S, config: Config) -> Self
    where
        S: LunchStore + 'static,
    {
        Self::with_store(Arc::new(store), config)
    }

    pub fn with_store(store: Arc<dyn LunchStore>, config: Config) -> Self {
        Self {
            store,
            config,
            sessions: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Ventana de reserva a partir de hoy
    pub fn booking_window(&self) -> BookingWindow {
        BookingWindow::starting_today(self.config.booking_window_days)
    }

    /// Sesión del alumno, creada vacía si no existe
    pub fn session(&self, email: &str) -> SharedSession {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .entry(normalize_email(email))
            .or_insert_with(|| Arc::new(Mutex::new(SelectionSession::default())))
            .clone()
    }

    /// Libera la sesión si nadie la está usando y no tiene cambios pendientes
    ///
    /// Los clones de la sesión solo se obtienen con el mapa bloqueado, así que
    /// si el mapa es el único dueño ninguna petición puede estar esperándola.
    pub fn release_session(&self, email: &str) -> bool {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = normalize_email(email);

        let idle = match sessions.get(&key) {
            Some(session) if Arc::strong_count(session) == 1 => session
                .try_lock()
                .map(|session| !session.reconciler.has_changes())
                .unwrap_or(false),
            _ => false,
        };
        if idle {
            sessions.remove(&key);
        }
        idle
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
