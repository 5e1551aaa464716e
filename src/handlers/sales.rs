/// Ticket sale recording.
use super::reply::{status_error, status_ok};
use crate::db::models::{Sale, SaleRequest};
use crate::db::Stores;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Utc;

/// Record a completed sale
/// POST /ventas
pub async fn register_sale(
    stores: web::Data<Stores>,
    req: web::Json<SaleRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    if !req.is_complete() {
        log::error!("Sale rejected, missing or non-positive fields for {}", req.cedula);
        return Ok(status_error(
            StatusCode::BAD_REQUEST,
            "Todos los campos son obligatorios",
        ));
    }

    let sale = Sale::from_request(req, Utc::now());
    match stores.insert_sale(&sale).await {
        Ok(id) => {
            log::info!("Sale {} recorded for {}", id, sale.cedula);
            Ok(status_ok("Venta registrada exitosamente"))
        }
        Err(e) => {
            log::error!("Failed to record sale: {}", e);
            Ok(status_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al registrar la venta",
            ))
        }
    }
}
