//! # Escola Almoço
//!
//! Servicio de reservas de almuerzo escolar: los alumnos marcan los días en
//! que comen en la cantina y la app consulta los menús publicados.
//!
//! - [`lunch`] - Lógica pura de selección de días
//! - [`api`] - Rutas HTTP (Actix Web)
//! - [`db`] - Persistencia (MongoDB o memoria)
//! - [`config`] - Configuración por variables de entorno

pub mod api;
pub mod config;
pub mod db;
pub mod lunch;
