//! Naming utilities for TableSync
//!
//! Identifier quoting, reserved field names and table prefixing.

/// Field names that collide with MySQL keywords and must be backticked
/// wherever they appear as an identifier.
pub const RESERVED_FIELD_NAMES: &[&str] = &["key", "index", "order", "group"];

/// Check whether a field name is in the reserved set (quoted or not)
pub fn is_reserved(name: &str) -> bool {
    let bare = unquote(name);
    RESERVED_FIELD_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(bare))
}

/// Strip one pair of surrounding backticks, if present
pub fn unquote(name: &str) -> &str {
    name.strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
        .unwrap_or(name)
}

/// The form a field name takes as a key in a table definition.
///
/// Reserved names are always backticked, everything else is stored bare, so
/// `key` and `` `key` `` in a declaration end up under the same key as the
/// introspected column.
pub fn field_key(name: &str) -> String {
    let bare = unquote(name);
    if is_reserved(bare) {
        format!("`{}`", bare)
    } else {
        bare.to_string()
    }
}

/// Quote an identifier for MySQL, leaving already-quoted names alone
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", unquote(name).replace('`', "``"))
}

/// Apply the configured table prefix
pub fn prefixed_table(prefix: &str, table: &str) -> String {
    format!("{}{}", prefix, table)
}

/// Format name as a valid file name (for journal files)
pub fn format_file_name(name: &str) -> String {
    let sanitized = name.replace(
        |c: char| matches!(c, ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '`'),
        "_",
    );

    sanitized.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("key"));
        assert!(is_reserved("`key`"));
        assert!(is_reserved("ORDER"));
        assert!(!is_reserved("site_id"));
    }

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("key"), "`key`");
        assert_eq!(field_key("`key`"), "`key`");
        assert_eq!(field_key("value"), "value");
        assert_eq!(field_key("`value`"), "value");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("site_id"), "`site_id`");
        assert_eq!(quote_identifier("`key`"), "`key`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_prefixed_table() {
        assert_eq!(prefixed_table("exp_", "crypto_settings"), "exp_crypto_settings");
        assert_eq!(prefixed_table("", "crypto_settings"), "crypto_settings");
    }

    #[test]
    fn test_format_file_name() {
        assert_eq!(format_file_name("Crypto Settings"), "crypto_settings");
        assert_eq!(format_file_name("a/b:c"), "a_b_c");
    }
}
