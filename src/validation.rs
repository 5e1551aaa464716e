/// Field-level validation of user records submitted for registration or update.
use crate::db::models::User;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Field name -> end-user message. Empty when the record is valid.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Symbols accepted as the "special character" class of a password.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

// Whitespace is the ASCII set only: tab, newline, form feed, carriage return, space.
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\t\n\f\r ]+$").expect("name regex is valid")
});
static DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digits regex is valid"));
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\t\n\f\r @]+@[^\t\n\f\r @]+\.[^\t\n\f\r @]+$").expect("email regex is valid")
});
static LOWERCASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]").expect("lowercase regex is valid"));
static UPPERCASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("uppercase regex is valid"));
static DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("digit regex is valid"));
static SYMBOL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[{}]", regex::escape(PASSWORD_SYMBOLS))).expect("symbol regex is valid")
});

/// Check every field of `user`, reporting the first failing rule per field.
pub fn validate_user(user: &User) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let checks = [
        ("nombres", check_name(&user.nombres, NameKind::FirstName)),
        ("apellidos", check_name(&user.apellidos, NameKind::LastName)),
        ("cedula", check_cedula(&user.cedula)),
        ("correo", check_email(&user.correo)),
        ("telefono", check_phone(&user.telefono)),
        ("contrasena", check_password(&user.contrasena)),
        ("foto", check_photo(&user.foto)),
    ];

    for (field, result) in checks {
        if let Err(message) = result {
            errors.insert(field, message);
        }
    }

    errors
}

#[derive(Clone, Copy)]
enum NameKind {
    FirstName,
    LastName,
}

fn check_name(value: &str, kind: NameKind) -> Result<(), &'static str> {
    let (required, letters_only, too_short) = match kind {
        NameKind::FirstName => (
            "El nombre es obligatorio",
            "El nombre solo debe contener letras",
            "El nombre debe tener al menos 2 caracteres",
        ),
        NameKind::LastName => (
            "El apellido es obligatorio",
            "El apellido solo debe contener letras",
            "El apellido debe tener al menos 2 caracteres",
        ),
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(required)
    } else if !NAME_REGEX.is_match(value) {
        Err(letters_only)
    } else if trimmed.chars().count() < 2 {
        Err(too_short)
    } else {
        Ok(())
    }
}

fn check_cedula(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("La cédula es obligatoria")
    } else if !DIGITS_REGEX.is_match(value) {
        Err("La cédula solo debe contener números")
    } else if !(5..=12).contains(&value.len()) {
        Err("La cédula debe tener entre 5 y 12 dígitos")
    } else {
        Ok(())
    }
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with at least one character on each side.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

fn check_email(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("El correo electrónico es obligatorio")
    } else if !is_valid_email(value) {
        Err("Ingrese un correo electrónico válido")
    } else {
        Ok(())
    }
}

fn check_phone(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("El teléfono es obligatorio")
    } else if !DIGITS_REGEX.is_match(value) {
        Err("El teléfono solo debe contener números")
    } else if !(7..=15).contains(&value.len()) {
        Err("El teléfono debe tener entre 7 y 15 dígitos")
    } else {
        Ok(())
    }
}

fn check_password(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("La contraseña es obligatoria");
    }
    if value.chars().count() < 8 {
        return Err("La contraseña debe tener al menos 8 caracteres");
    }

    if LOWERCASE_REGEX.is_match(value)
        && UPPERCASE_REGEX.is_match(value)
        && DIGIT_REGEX.is_match(value)
        && SYMBOL_REGEX.is_match(value)
    {
        Ok(())
    } else {
        Err("La contraseña debe contener al menos una letra minúscula, una mayúscula, un número y un carácter especial")
    }
}

fn check_photo(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("La foto es obligatoria")
    } else {
        Ok(())
    }
}
