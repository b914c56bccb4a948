use serde::{Deserialize, Serialize};

use crate::lunch::ReservationDay;

/// Almuerzo reservado por un alumno para un día
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LunchReservation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<mongodb::bson::oid::ObjectId>,
    pub email: String,
    pub dia: ReservationDay,
    pub turma: String,
    pub created_at: i64, // timestamp unix
}

/// Alumno con derecho a almuerzo
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Student {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<mongodb::bson::oid::ObjectId>,
    pub email: String,
    pub nome: String,
    pub turma: String,
}

/// Timestamp unix actual
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
