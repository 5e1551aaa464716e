/// Data models for database operations.
/// Represents users, sales and login log entries, plus the request payloads
/// that carry only part of a record.
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Status stamped on every sale at creation. Sales have no further lifecycle.
pub const SALE_STATUS: &str = "completado";

/// America/Bogota has no daylight saving time; it is always UTC-5.
const BOGOTA_UTC_OFFSET_SECONDS: i32 = 5 * 3600;

const LOGIN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Registered user. Also the payload of the registration and update endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub nombres: String,
    pub apellidos: String,
    pub cedula: String,
    pub correo: String,
    pub telefono: String,
    pub contrasena: String,
    pub foto: String,
    #[serde(rename = "ultimaSesion", skip_serializing_if = "Option::is_none")]
    pub ultima_sesion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub nombre: String,
    pub cedula: String,
    pub telefono: String,
    pub direccion: String,
    pub correo: String,
    pub zona: String,
    pub cantidad: i64,
    pub total: f64,
    pub fecha: String,
    pub estado: String,
}

impl Sale {
    /// Build the persisted record, stamping the server time and fixed status.
    pub fn from_request(req: SaleRequest, now: DateTime<Utc>) -> Self {
        Sale {
            nombre: req.nombre,
            cedula: req.cedula,
            telefono: req.telefono,
            direccion: req.direccion,
            correo: req.correo,
            zona: req.zona,
            cantidad: req.cantidad,
            total: req.total,
            fecha: now.to_rfc3339(),
            estado: SALE_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginLog {
    pub cedula: String,
    pub fecha_hora: String,
}

impl LoginLog {
    pub fn new(cedula: &str, now: DateTime<Utc>) -> Self {
        LoginLog {
            cedula: cedula.to_string(),
            fecha_hora: login_timestamp(now),
        }
    }
}

/// Format `now` in Bogota local time, e.g. `2025-03-01 09:30:00`.
pub fn login_timestamp(now: DateTime<Utc>) -> String {
    let bogota = FixedOffset::west_opt(BOGOTA_UTC_OFFSET_SECONDS)
        .expect("UTC-5 is within the valid offset range");
    now.with_timezone(&bogota)
        .format(LOGIN_TIMESTAMP_FORMAT)
        .to_string()
}

// Request DTOs. Missing fields fall back to empty values and are rejected by
// the handlers' own checks rather than by the JSON extractor.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleRequest {
    pub nombre: String,
    pub cedula: String,
    pub telefono: String,
    pub direccion: String,
    pub correo: String,
    pub zona: String,
    pub cantidad: i64,
    pub total: f64,
}

impl SaleRequest {
    /// `direccion` is the only optional field.
    pub fn is_complete(&self) -> bool {
        !self.nombre.is_empty()
            && !self.cedula.is_empty()
            && !self.correo.is_empty()
            && !self.telefono.is_empty()
            && !self.zona.is_empty()
            && self.cantidad > 0
            && self.total > 0.0
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub cedula: String,
    pub contrasena: String,
    pub foto: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CedulaRequest {
    pub cedula: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceCheckRequest {
    pub cedula: String,
    pub foto: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LastSessionRequest {
    pub cedula: String,
    #[serde(rename = "ultimaSesion")]
    pub ultima_sesion: String,
}
