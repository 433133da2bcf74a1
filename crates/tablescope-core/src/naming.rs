//! Identifier cleanup and default-schema qualification.
//!
//! Names reach this module in the form the parser renders them, so a single
//! name may mix enclosure styles: `` `db`.`orders` ``, `[dbo].[orders]`,
//! `"public"."orders"`. Cleanup removes every enclosure character regardless
//! of the style that produced it.

const ENCLOSURE_CHARS: [char; 4] = ['`', '[', ']', '"'];

/// Separator between schema and object name.
pub const QUALIFIER_SEPARATOR: char = '.';

/// Strips backtick, bracket and double-quote characters from an identifier.
///
/// # Examples
/// - `` `db`.`t` `` → `db.t`
/// - `[dbo].[t]` → `dbo.t`
/// - `"public"."t"` → `public.t`
pub fn clean_enclosures(name: &str) -> String {
    name.chars()
        .filter(|ch| !ENCLOSURE_CHARS.contains(ch))
        .collect()
}

/// Returns true if the raw name carries a schema (or any other) qualifier.
pub fn is_qualified(name: &str) -> bool {
    name.contains(QUALIFIER_SEPARATOR)
}

/// Returns the fully-qualified, cleaned form of `name`.
///
/// Unqualified names get `default_schema` prefixed before cleanup; qualified
/// names, and all names when no default schema is set, are only cleaned.
pub fn qualify(name: &str, default_schema: Option<&str>) -> String {
    match default_schema {
        Some(schema) if !is_qualified(name) => {
            clean_enclosures(&format!("{schema}{QUALIFIER_SEPARATOR}{name}"))
        }
        _ => clean_enclosures(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_every_enclosure_style() {
        assert_eq!(clean_enclosures("`db`.`orders`"), "db.orders");
        assert_eq!(clean_enclosures("[dbo].[orders]"), "dbo.orders");
        assert_eq!(clean_enclosures("\"public\".\"orders\""), "public.orders");
        assert_eq!(clean_enclosures("plain"), "plain");
    }

    #[test]
    fn cleans_mixed_styles() {
        assert_eq!(clean_enclosures("[db].\"s\".`t`"), "db.s.t");
    }

    #[test]
    fn qualifies_unqualified_names() {
        assert_eq!(qualify("t", Some("s")), "s.t");
        assert_eq!(qualify("`t`", Some("s")), "s.t");
    }

    #[test]
    fn keeps_existing_qualifier() {
        assert_eq!(qualify("x.t", Some("s")), "x.t");
        assert_eq!(qualify("[x].[t]", Some("s")), "x.t");
    }

    #[test]
    fn no_default_schema_only_cleans() {
        assert_eq!(qualify("\"t\"", None), "t");
    }

    #[test]
    fn default_schema_enclosures_are_cleaned_too() {
        assert_eq!(qualify("t", Some("`stage`")), "stage.t");
    }
}
