//! Validation helpers for DTOs.

use validator::{ValidationError, ValidationErrors};

/// Validates that an owner name contains something other than whitespace.
pub fn validate_owner_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("owner_name_required");
        err.message = Some("Owner name is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a `#rgb` or `#rrggbb` hex color.
///
/// # Examples
///
/// ```ignore
/// validate_theme_color("#1e90ff") // Ok
/// validate_theme_color("1e90ff")  // Err - missing '#'
/// ```
pub fn validate_theme_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("theme_color_format");
        err.message = Some("Theme color must be a hex color like #1e90ff.".into());
        return Err(err);
    }
    Ok(())
}

/// First human-readable message of a validation failure, in field order.
pub fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| format!("validation failed: {errors}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_name_must_not_be_blank() {
        assert!(validate_owner_name("Amy").is_ok());
        let err = validate_owner_name("   ").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("Owner name is required."));
    }

    #[test]
    fn theme_color_accepts_short_and_long_hex() {
        assert!(validate_theme_color("#fff").is_ok());
        assert!(validate_theme_color("#1E90ff").is_ok());
        assert!(validate_theme_color("1e90ff").is_err());
        assert!(validate_theme_color("#12345").is_err());
        assert!(validate_theme_color("#gggggg").is_err());
    }
}
