//! # Configuración
//!
//! Lee la configuración desde variables de entorno (archivo `.env` cargado
//! con `dotenvy` antes de llamar a [`Config::from_env`]).

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::lunch::window::DEFAULT_WINDOW_DAYS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Valor inválido para {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Backend de persistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MongoDb,
    /// Solo para desarrollo local, los datos se pierden al reiniciar
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub bind_address: String,
    pub booking_window_days: u32,
    pub request_timeout: Duration,
    pub store: StoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "escola_almoco".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            booking_window_days: DEFAULT_WINDOW_DAYS,
            request_timeout: Duration::from_secs(10),
            store: StoreKind::MongoDb,
        }
    }
}

impl Config {
    /// Construye la configuración a partir del entorno
    ///
    /// # Variables de entorno
    ///
    /// - `MONGODB_URI`: URI de conexión (default: mongodb://localhost:27017)
    /// - `MONGODB_DATABASE`: nombre de la base de datos (default: escola_almoco)
    /// - `BIND_ADDRESS`: dirección del servidor (default: 0.0.0.0:8080)
    /// - `BOOKING_WINDOW_DAYS`: días reservables desde hoy (default: 30)
    /// - `REQUEST_TIMEOUT_SECS`: límite por operación de base de datos (default: 10)
    /// - `STORE`: `mongodb` o `memory` (default: mongodb)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let booking_window_days = match get("BOOKING_WINDOW_DAYS") {
            Some(raw) => parse_number("BOOKING_WINDOW_DAYS", &raw)?,
            None => defaults.booking_window_days,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let store = match get("STORE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("mongodb") | Some("mongo") => StoreKind::MongoDb,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            mongodb_uri: get("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            mongodb_database: get("MONGODB_DATABASE").unwrap_or(defaults.mongodb_database),
            bind_address: get("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            booking_window_days,
            request_timeout,
            store,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}
