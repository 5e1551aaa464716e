/// Database layer for persistent storage.
/// `Database` holds the single-store primitives; `Stores` pairs the primary
/// store with the optional mirror and bounds every primary call by a timeout.

pub mod init;
pub mod models;
pub mod replica;

use crate::error::{StoreError, StoreResult};
use models::{LoginLog, Sale, User};
use replica::{Mirror, Mutation, ReplicationOutcome};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub type DbPool = Arc<Mutex<Connection>>;

/// Bound for single-record lookups used as pre-checks.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
/// Bound for the full-record fetch endpoint.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long SQLite waits on a lock held by another connection before
/// answering `SQLITE_BUSY`. Kept at or below every operation bound.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

const USER_COLUMNS: &str =
    "nombres, apellidos, cedula, correo, telefono, contrasena, foto, ultima_sesion";

/// Open (or create) a database file and make sure the schema exists
pub fn create_pool(db_path: &str) -> SqliteResult<DbPool> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init::initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Create an in-memory database for testing
pub fn create_test_pool() -> DbPool {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory DB");
    init::initialize_database(&conn).expect("Failed to initialize DB");
    Arc::new(Mutex::new(conn))
}

/// Run a store call, turning an elapsed deadline or a busy database into
/// `StoreError::Timeout`.
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Err(e)) if e.is_busy() => Err(StoreError::Timeout { operation, limit }),
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { operation, limit }),
    }
}

/// Run `work` against the connection on the blocking pool, so a slow or
/// locked database never stalls the async workers.
async fn with_conn<T, F>(pool: &DbPool, work: F) -> StoreResult<T>
where
    F: FnOnce(&Connection) -> SqliteResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = Arc::clone(pool);
    let result = tokio::task::spawn_blocking(move || {
        let conn = pool.blocking_lock();
        work(&conn)
    })
    .await?;

    Ok(result?)
}

fn user_from_row(row: &Row<'_>) -> SqliteResult<User> {
    Ok(User {
        nombres: row.get(0)?,
        apellidos: row.get(1)?,
        cedula: row.get(2)?,
        correo: row.get(3)?,
        telefono: row.get(4)?,
        contrasena: row.get(5)?,
        foto: row.get(6)?,
        ultima_sesion: row.get(7)?,
    })
}

/// Database operations against a single store
pub struct Database;

impl Database {
    /// Cheap liveness check: the connection answers and the schema is there.
    pub async fn ping(pool: &DbPool) -> StoreResult<()> {
        with_conn(pool, |conn| {
            conn.query_row("SELECT 1 FROM usuarios LIMIT 1", [], |_| Ok(()))
                .optional()?;
            Ok(())
        })
        .await
    }

    pub async fn find_user(pool: &DbPool, cedula: &str) -> StoreResult<Option<User>> {
        let cedula = cedula.to_string();
        with_conn(pool, move |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM usuarios WHERE cedula = ?1", USER_COLUMNS))?;
            let user = stmt.query_row(params![cedula], user_from_row).optional()?;
            Ok(user)
        })
        .await
    }

    pub async fn find_user_by_email(pool: &DbPool, correo: &str) -> StoreResult<Option<User>> {
        let correo = correo.to_string();
        with_conn(pool, move |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM usuarios WHERE correo = ?1", USER_COLUMNS))?;
            let user = stmt.query_row(params![correo], user_from_row).optional()?;
            Ok(user)
        })
        .await
    }

    pub async fn insert_user(pool: &DbPool, user: &User) -> StoreResult<()> {
        let user = user.clone();
        with_conn(pool, move |conn| {
            conn.execute(
                "INSERT INTO usuarios (nombres, apellidos, cedula, correo, telefono, contrasena, foto, ultima_sesion)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.nombres,
                    user.apellidos,
                    user.cedula,
                    user.correo,
                    user.telefono,
                    user.contrasena,
                    user.foto,
                    user.ultima_sesion,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Overwrite the profile fields of an existing user. Returns whether a row matched.
    /// The last-session timestamp is left untouched.
    pub async fn update_user(pool: &DbPool, user: &User) -> StoreResult<bool> {
        let user = user.clone();
        with_conn(pool, move |conn| {
            let changed = conn.execute(
                "UPDATE usuarios
                 SET nombres = ?1, apellidos = ?2, correo = ?3, telefono = ?4, contrasena = ?5, foto = ?6
                 WHERE cedula = ?7",
                params![
                    user.nombres,
                    user.apellidos,
                    user.correo,
                    user.telefono,
                    user.contrasena,
                    user.foto,
                    user.cedula,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    pub async fn touch_last_session(
        pool: &DbPool,
        cedula: &str,
        ultima_sesion: &str,
    ) -> StoreResult<bool> {
        let cedula = cedula.to_string();
        let ultima_sesion = ultima_sesion.to_string();
        with_conn(pool, move |conn| {
            let changed = conn.execute(
                "UPDATE usuarios SET ultima_sesion = ?1 WHERE cedula = ?2",
                params![ultima_sesion, cedula],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    pub async fn delete_user(pool: &DbPool, cedula: &str) -> StoreResult<bool> {
        let cedula = cedula.to_string();
        with_conn(pool, move |conn| {
            let deleted =
                conn.execute("DELETE FROM usuarios WHERE cedula = ?1", params![cedula])?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Append a sale and return its row id
    pub async fn insert_sale(pool: &DbPool, sale: &Sale) -> StoreResult<i64> {
        let sale = sale.clone();
        with_conn(pool, move |conn| {
            conn.execute(
                "INSERT INTO ventas (nombre, cedula, telefono, direccion, correo, zona, cantidad, total, fecha, estado)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    sale.nombre,
                    sale.cedula,
                    sale.telefono,
                    sale.direccion,
                    sale.correo,
                    sale.zona,
                    sale.cantidad,
                    sale.total,
                    sale.fecha,
                    sale.estado,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn sales_for_cedula(pool: &DbPool, cedula: &str) -> StoreResult<Vec<Sale>> {
        let cedula = cedula.to_string();
        with_conn(pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT nombre, cedula, telefono, direccion, correo, zona, cantidad, total, fecha, estado
                 FROM ventas WHERE cedula = ?1 ORDER BY id",
            )?;

            let sales = stmt
                .query_map(params![cedula], |row| {
                    Ok(Sale {
                        nombre: row.get(0)?,
                        cedula: row.get(1)?,
                        telefono: row.get(2)?,
                        direccion: row.get(3)?,
                        correo: row.get(4)?,
                        zona: row.get(5)?,
                        cantidad: row.get(6)?,
                        total: row.get(7)?,
                        fecha: row.get(8)?,
                        estado: row.get(9)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(sales)
        })
        .await
    }

    pub async fn insert_login_log(pool: &DbPool, entry: &LoginLog) -> StoreResult<()> {
        let entry = entry.clone();
        with_conn(pool, move |conn| {
            conn.execute(
                "INSERT INTO logs (cedula, fecha_hora) VALUES (?1, ?2)",
                params![entry.cedula, entry.fecha_hora],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn login_logs_for_cedula(pool: &DbPool, cedula: &str) -> StoreResult<Vec<LoginLog>> {
        let cedula = cedula.to_string();
        with_conn(pool, move |conn| {
            let mut stmt =
                conn.prepare("SELECT cedula, fecha_hora FROM logs WHERE cedula = ?1 ORDER BY id")?;

            let entries = stmt
                .query_map(params![cedula], |row| {
                    Ok(LoginLog {
                        cedula: row.get(0)?,
                        fecha_hora: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(entries)
        })
        .await
    }
}

/// Liveness of the mirror as reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStatus {
    Connected,
    Unavailable,
    Disabled,
}

impl MirrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorStatus::Connected => "connected",
            MirrorStatus::Unavailable => "unavailable",
            MirrorStatus::Disabled => "disabled",
        }
    }
}

/// The authoritative primary store plus the best-effort mirror.
///
/// Primary results are returned to the caller. Mirror outcomes are only logged:
/// no method here fails because of the mirror.
pub struct Stores {
    primary: DbPool,
    mirror: Option<Mirror>,
}

impl Stores {
    pub fn new(primary: DbPool, mirror: Option<Mirror>) -> Self {
        Stores { primary, mirror }
    }

    pub fn primary(&self) -> &DbPool {
        &self.primary
    }

    pub async fn mirror_status(&self) -> MirrorStatus {
        match &self.mirror {
            None => MirrorStatus::Disabled,
            Some(mirror) => match mirror.probe().await {
                Ok(()) => MirrorStatus::Connected,
                Err(_) => MirrorStatus::Unavailable,
            },
        }
    }

    pub async fn find_user(&self, cedula: &str, limit: Duration) -> StoreResult<Option<User>> {
        bounded("find user", limit, Database::find_user(&self.primary, cedula)).await
    }

    pub async fn find_user_by_email(&self, correo: &str) -> StoreResult<Option<User>> {
        bounded(
            "find user by email",
            LOOKUP_TIMEOUT,
            Database::find_user_by_email(&self.primary, correo),
        )
        .await
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        bounded("insert user", WRITE_TIMEOUT, Database::insert_user(&self.primary, user)).await?;
        self.replicate(Mutation::InsertUser(user.clone())).await;
        Ok(())
    }

    /// Returns `Ok(false)` when no user has that cedula; nothing is replicated then.
    pub async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let matched =
            bounded("update user", WRITE_TIMEOUT, Database::update_user(&self.primary, user))
                .await?;
        if matched {
            self.replicate(Mutation::UpdateUser(user.clone())).await;
        }
        Ok(matched)
    }

    pub async fn touch_last_session(&self, cedula: &str, ultima_sesion: &str) -> StoreResult<bool> {
        let matched = bounded(
            "update last session",
            WRITE_TIMEOUT,
            Database::touch_last_session(&self.primary, cedula, ultima_sesion),
        )
        .await?;
        if matched {
            self.replicate(Mutation::TouchLastSession {
                cedula: cedula.to_string(),
                ultima_sesion: ultima_sesion.to_string(),
            })
            .await;
        }
        Ok(matched)
    }

    pub async fn delete_user(&self, cedula: &str) -> StoreResult<bool> {
        let deleted =
            bounded("delete user", WRITE_TIMEOUT, Database::delete_user(&self.primary, cedula))
                .await?;
        if deleted {
            self.replicate(Mutation::DeleteUser(cedula.to_string())).await;
        }
        Ok(deleted)
    }

    pub async fn insert_sale(&self, sale: &Sale) -> StoreResult<i64> {
        let id =
            bounded("insert sale", WRITE_TIMEOUT, Database::insert_sale(&self.primary, sale)).await?;
        self.replicate(Mutation::InsertSale(sale.clone())).await;
        Ok(id)
    }

    /// Append a login entry to both stores. Failures are logged, never returned.
    pub async fn record_login(&self, entry: &LoginLog) {
        if let Err(e) = bounded(
            "insert login log",
            WRITE_TIMEOUT,
            Database::insert_login_log(&self.primary, entry),
        )
        .await
        {
            log::warn!("Could not record login for {} in primary store: {}", entry.cedula, e);
        }
        self.replicate(Mutation::InsertLoginLog(entry.clone())).await;
    }

    async fn replicate(&self, mutation: Mutation) -> ReplicationOutcome {
        match &self.mirror {
            Some(mirror) => mirror.apply(&mutation).await,
            None => ReplicationOutcome::Disabled,
        }
    }
}
