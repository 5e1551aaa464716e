/// HTTP server factory and configuration.
/// Provides the route table and CORS policy shared by the main binary and tests.

use crate::db::Stores;
use crate::face::FaceClient;
use crate::handlers::reply::{json_config, Envelope};
use crate::handlers::{
    delete_user, get_user, health, login, register_sale, register_user, update_last_session,
    update_user, verify_email, verify_face,
};
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};

const CORS_MAX_AGE_SECONDS: usize = 12 * 60 * 60;

/// Register every endpoint. Each route gets a JSON extractor config so that
/// unparsable bodies are answered in that route's envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::resource("/registro")
                .app_data(json_config(Envelope::Status, "Datos inválidos"))
                .route(web::post().to(register_user)),
        )
        .service(
            web::resource("/login")
                .app_data(json_config(Envelope::Success, "Datos inválidos"))
                .route(web::post().to(login)),
        )
        .service(
            web::resource("/ventas")
                .app_data(json_config(Envelope::Status, "Datos inválidos"))
                .route(web::post().to(register_sale)),
        )
        .service(
            web::resource("/obtener-usuario")
                .app_data(json_config(
                    Envelope::Status,
                    "Por favor, ingrese una cédula válida",
                ))
                .route(web::post().to(get_user)),
        )
        .service(
            web::resource("/actualizar-usuario")
                .app_data(json_config(Envelope::Status, "Datos inválidos"))
                .route(web::put().to(update_user)),
        )
        .service(
            web::resource("/eliminar-usuario")
                .app_data(json_config(Envelope::Status, "Cédula inválida"))
                .route(web::delete().to(delete_user)),
        )
        .service(
            web::resource("/verificar-correo")
                .app_data(json_config(Envelope::Success, "Datos inválidos"))
                .route(web::post().to(verify_email)),
        )
        .service(
            web::resource("/verificar-rostro")
                .app_data(json_config(Envelope::Success, "Datos inválidos"))
                .route(web::post().to(verify_face)),
        )
        .service(
            web::resource("/actualizar-ultima-sesion")
                .app_data(json_config(Envelope::Success, "Datos inválidos"))
                .route(web::put().to(update_last_session)),
        );
}

/// CORS policy: a single allowed origin, credentials enabled.
pub fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["POST", "GET", "PUT", "DELETE", "OPTIONS"])
        .allowed_header(header::CONTENT_TYPE)
        .expose_headers(vec![header::CONTENT_LENGTH])
        .supports_credentials()
        .max_age(CORS_MAX_AGE_SECONDS)
}

/// Create a configured HTTP server
///
/// # Arguments
/// * `stores` - Primary store and optional mirror wrapped in web::Data
/// * `face` - Face comparison client wrapped in web::Data
/// * `cors_origin` - The only origin allowed to call the API from a browser
/// * `bind_addr` - Address to bind the server to (e.g., "127.0.0.1:8080")
pub fn create_http_server(
    stores: web::Data<Stores>,
    face: web::Data<FaceClient>,
    cors_origin: &str,
    bind_addr: &str,
) -> std::io::Result<actix_web::dev::Server> {
    let origin = cors_origin.to_string();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(stores.clone())
            .app_data(face.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors(&origin))
            .configure(configure)
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
