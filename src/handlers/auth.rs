/// Password + face login and standalone face verification.
use super::reply::{success_error, success_ok};
use crate::db::models::{FaceCheckRequest, LoginLog, LoginRequest};
use crate::db::{Stores, LOOKUP_TIMEOUT};
use crate::face::FaceClient;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use serde_json::json;

const INVALID_CREDENTIALS: &str = "Cédula o contraseña incorrecta";
const FACE_MISMATCH: &str = "Verificación facial fallida";

/// Log a user in. Lookup, password and face checks run in order and stop at
/// the first failure; nothing is written unless all three pass.
/// POST /login
pub async fn login(
    stores: web::Data<Stores>,
    face: web::Data<FaceClient>,
    req: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    let user = match stores.find_user(&req.cedula, LOOKUP_TIMEOUT).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::error!("Login failed, unknown cedula {}", req.cedula);
            return Ok(success_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
        }
        Err(e) => {
            log::error!("Login failed, lookup error for {}: {}", req.cedula, e);
            return Ok(success_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
        }
    };

    if req.contrasena != user.contrasena {
        log::error!("Login failed, wrong password for {}", req.cedula);
        return Ok(success_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    if !face.compare(&user.foto, &req.foto).await {
        log::error!("Login failed, face mismatch for {}", req.cedula);
        return Ok(success_error(StatusCode::UNAUTHORIZED, FACE_MISMATCH));
    }

    stores.record_login(&LoginLog::new(&req.cedula, Utc::now())).await;

    log::info!("Login succeeded for {}", req.cedula);
    Ok(success_ok(json!({ "mensaje": "Inicio de sesión exitoso" })))
}

/// Compare a fresh photo against the stored one without a password
/// POST /verificar-rostro
pub async fn verify_face(
    stores: web::Data<Stores>,
    face: web::Data<FaceClient>,
    req: web::Json<FaceCheckRequest>,
) -> ActixResult<HttpResponse> {
    if req.cedula.is_empty() || req.foto.is_empty() {
        log::error!("Face check with empty cedula or photo");
        return Ok(success_error(
            StatusCode::BAD_REQUEST,
            "La cédula y la foto no pueden estar vacías",
        ));
    }

    log::info!("Verifying face for {}", req.cedula);
    let user = match stores.find_user(&req.cedula, LOOKUP_TIMEOUT).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::info!("No user with cedula {}", req.cedula);
            return Ok(success_error(
                StatusCode::NOT_FOUND,
                "No se encontró ningún usuario con esa cédula",
            ));
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            return Ok(success_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno al buscar usuario",
            ));
        }
    };

    if !face.compare(&user.foto, &req.foto).await {
        log::error!("Face check failed for {}", req.cedula);
        return Ok(success_error(StatusCode::UNAUTHORIZED, FACE_MISMATCH));
    }

    log::info!("Face check succeeded for {}", req.cedula);
    Ok(success_ok(json!({ "mensaje": "Verificación facial exitosa" })))
}
