/// Response envelopes shared by the handlers.
///
/// Two shapes are in use, depending on the endpoint:
/// `{"status": "success" | "error", "mensaje": ...}` and
/// `{"success": true | false, "mensaje" | "error": ...}`.
use crate::validation::FieldErrors;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{json, Value};

/// Photos travel as base64 inside the JSON body.
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Status,
    Success,
}

pub fn status_ok(mensaje: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "mensaje": mensaje
    }))
}

pub fn status_error(code: StatusCode, mensaje: &str) -> HttpResponse {
    HttpResponse::build(code).json(json!({
        "status": "error",
        "mensaje": mensaje
    }))
}

pub fn validation_failed(errors: &FieldErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "status": "error",
        "mensaje": "Datos inválidos",
        "errores": errors
    }))
}

/// `{"success": true}` merged with the given fields.
pub fn success_ok(fields: Value) -> HttpResponse {
    let mut body = json!({ "success": true });
    if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), fields) {
        target.extend(extra);
    }
    HttpResponse::Ok().json(body)
}

pub fn success_error(code: StatusCode, error: &str) -> HttpResponse {
    HttpResponse::build(code).json(json!({
        "success": false,
        "error": error
    }))
}

pub fn bad_request(envelope: Envelope, message: &str) -> HttpResponse {
    match envelope {
        Envelope::Status => status_error(StatusCode::BAD_REQUEST, message),
        Envelope::Success => success_error(StatusCode::BAD_REQUEST, message),
    }
}

/// JSON extractor config that answers unparsable bodies with a 400 in the
/// route's own envelope.
pub fn json_config(envelope: Envelope, message: &'static str) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(move |err: JsonPayloadError, req: &HttpRequest| {
            log::error!("Invalid JSON payload on {}: {}", req.path(), err);
            InternalError::from_response(err, bad_request(envelope, message)).into()
        })
}
