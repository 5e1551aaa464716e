/// REST handlers for user records: registration, lookup, update, delete,
/// email lookup and last-session stamping.
use super::reply::{self, status_error, status_ok, success_error, success_ok};
use crate::db::models::{CedulaRequest, EmailRequest, LastSessionRequest, User};
use crate::db::{Stores, FETCH_TIMEOUT, LOOKUP_TIMEOUT};
use crate::validation::validate_user;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde_json::json;

/// Register a new user
/// POST /registro
pub async fn register_user(
    stores: web::Data<Stores>,
    req: web::Json<User>,
) -> ActixResult<HttpResponse> {
    let mut user = req.into_inner();
    user.ultima_sesion = None;

    let errors = validate_user(&user);
    if !errors.is_empty() {
        log::error!("Registration rejected, invalid fields: {:?}", errors);
        return Ok(reply::validation_failed(&errors));
    }

    match stores.find_user(&user.cedula, LOOKUP_TIMEOUT).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            log::error!("A user with cedula {} already exists", user.cedula);
            return Ok(status_error(
                StatusCode::CONFLICT,
                "Ya existe un usuario con esta cédula",
            ));
        }
        Err(e) => {
            log::error!("Failed to check existing cedula: {}", e);
            return Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al verificar usuario existente",
            ));
        }
    }

    match stores.find_user_by_email(&user.correo).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            log::error!("A user with email {} already exists", user.correo);
            return Ok(status_error(
                StatusCode::CONFLICT,
                "Ya existe un usuario con este correo electrónico",
            ));
        }
        Err(e) => {
            log::error!("Failed to check existing email: {}", e);
            return Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al verificar correo existente",
            ));
        }
    }

    match stores.insert_user(&user).await {
        Ok(()) => {
            log::info!("User registered: {}", user.cedula);
            Ok(status_ok("Usuario registrado con éxito"))
        }
        Err(e) if e.is_unique_violation() => {
            log::error!("Concurrent registration for cedula {}: {}", user.cedula, e);
            Ok(status_error(
                StatusCode::CONFLICT,
                "Ya existe un usuario con esta cédula o correo electrónico",
            ))
        }
        Err(e) => {
            log::error!("Failed to register user: {}", e);
            Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al registrar usuario",
            ))
        }
    }
}

/// Fetch a full user record
/// POST /obtener-usuario
pub async fn get_user(
    stores: web::Data<Stores>,
    req: web::Json<CedulaRequest>,
) -> ActixResult<HttpResponse> {
    if req.cedula.is_empty() {
        log::error!("User lookup with empty cedula");
        return Ok(status_error(
            StatusCode::BAD_REQUEST,
            "La cédula no puede estar vacía",
        ));
    }

    log::info!("Looking up user {}", req.cedula);
    match stores.find_user(&req.cedula, FETCH_TIMEOUT).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "data": user
        }))),
        Ok(None) => {
            log::info!("No user with cedula {}", req.cedula);
            Ok(status_error(
                StatusCode::NOT_FOUND,
                "No se encontró ningún usuario con esa cédula",
            ))
        }
        Err(e) if e.is_timeout() => {
            log::error!("User lookup timed out: {}", e);
            Ok(status_error(
                StatusCode::GATEWAY_TIMEOUT,
                "El servidor tardó demasiado en responder. Por favor, intente nuevamente",
            ))
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno al buscar usuario. Por favor, intente más tarde",
            ))
        }
    }
}

/// Replace the profile fields of an existing user
/// PUT /actualizar-usuario
pub async fn update_user(
    stores: web::Data<Stores>,
    req: web::Json<User>,
) -> ActixResult<HttpResponse> {
    let user = req.into_inner();

    let errors = validate_user(&user);
    if !errors.is_empty() {
        log::error!("Update rejected, invalid fields: {:?}", errors);
        return Ok(reply::validation_failed(&errors));
    }

    let existing = match stores.find_user(&user.cedula, LOOKUP_TIMEOUT).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            log::error!("No user with cedula {} to update", user.cedula);
            return Ok(status_error(StatusCode::NOT_FOUND, "Usuario no encontrado"));
        }
        Err(e) => {
            log::error!("Failed to look up user: {}", e);
            return Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al buscar usuario",
            ));
        }
    };

    if user.correo != existing.correo {
        match stores.find_user_by_email(&user.correo).await {
            Ok(Some(owner)) if owner.cedula != user.cedula => {
                log::error!("Email {} already belongs to another user", user.correo);
                return Ok(status_error(
                    StatusCode::CONFLICT,
                    "El correo electrónico ya está en uso por otro usuario",
                ));
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to check existing email: {}", e);
                return Ok(status_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error al verificar correo existente",
                ));
            }
        }
    }

    match stores.update_user(&user).await {
        Ok(true) => {
            log::info!("User updated: {}", user.cedula);
            Ok(status_ok("Usuario actualizado con éxito"))
        }
        Ok(false) => Ok(status_error(StatusCode::NOT_FOUND, "Usuario no encontrado")),
        Err(e) if e.is_unique_violation() => {
            log::error!("Email {} taken during update: {}", user.correo, e);
            Ok(status_error(
                StatusCode::CONFLICT,
                "El correo electrónico ya está en uso por otro usuario",
            ))
        }
        Err(e) => {
            log::error!("Failed to update user: {}", e);
            Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al actualizar usuario",
            ))
        }
    }
}

/// Delete a user
/// DELETE /eliminar-usuario
pub async fn delete_user(
    stores: web::Data<Stores>,
    req: web::Json<CedulaRequest>,
) -> ActixResult<HttpResponse> {
    match stores.delete_user(&req.cedula).await {
        Ok(true) => {
            log::info!("User deleted: {}", req.cedula);
            Ok(status_ok("Usuario eliminado con éxito"))
        }
        Ok(false) => Ok(status_error(StatusCode::NOT_FOUND, "Usuario no encontrado")),
        Err(e) => {
            log::error!("Failed to delete user: {}", e);
            Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al eliminar usuario",
            ))
        }
    }
}

/// Resolve an email to the owning cedula
/// POST /verificar-correo
pub async fn verify_email(
    stores: web::Data<Stores>,
    req: web::Json<EmailRequest>,
) -> ActixResult<HttpResponse> {
    if req.email.is_empty() {
        log::error!("Email lookup with empty email");
        return Ok(success_error(
            StatusCode::BAD_REQUEST,
            "El email no puede estar vacío",
        ));
    }

    log::info!("Checking email {}", req.email);
    match stores.find_user_by_email(&req.email).await {
        Ok(Some(user)) => Ok(success_ok(json!({ "cedula": user.cedula }))),
        Ok(None) => {
            log::info!("No user with email {}", req.email);
            Ok(success_error(
                StatusCode::NOT_FOUND,
                "No se encontró ningún usuario con ese correo",
            ))
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            Ok(success_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno al buscar usuario",
            ))
        }
    }
}

/// Store the client-supplied last-session timestamp
/// PUT /actualizar-ultima-sesion
pub async fn update_last_session(
    stores: web::Data<Stores>,
    req: web::Json<LastSessionRequest>,
) -> ActixResult<HttpResponse> {
    if req.cedula.is_empty() || req.ultima_sesion.is_empty() {
        log::error!("Last-session update with empty cedula or timestamp");
        return Ok(success_error(
            StatusCode::BAD_REQUEST,
            "La cédula y la fecha de última sesión no pueden estar vacías",
        ));
    }

    match stores
        .touch_last_session(&req.cedula, &req.ultima_sesion)
        .await
    {
        Ok(true) => {
            log::info!("Last session updated for {}", req.cedula);
            Ok(success_ok(json!({
                "mensaje": "Última sesión actualizada con éxito"
            })))
        }
        Ok(false) => Ok(success_error(StatusCode::NOT_FOUND, "Usuario no encontrado")),
        Err(e) => {
            log::error!("Failed to update last session: {}", e);
            Ok(success_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al actualizar última sesión",
            ))
        }
    }
}
