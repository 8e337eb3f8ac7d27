//! Font stacks — CSS-style `font-family` lists.
//!
//! A stack such as `"Lobster, \"Open Sans\", serif"` is parsed into an
//! ordered list of named and generic families. Named families keep their
//! original spelling; matching against the font database is
//! case-insensitive.

use std::fmt;

// ── Generic family ──────────────────────────────────────────────────

/// CSS generic font families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl GenericFamily {
    /// CSS keyword for this generic family.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Serif => "serif",
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
            Self::Cursive => "cursive",
            Self::Fantasy => "fantasy",
        }
    }
}

/// Parse a generic family keyword (case-insensitive).
pub fn parse_generic(name: &str) -> Option<GenericFamily> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Some(GenericFamily::Serif),
        "sans-serif" => Some(GenericFamily::SansSerif),
        "monospace" => Some(GenericFamily::Monospace),
        "cursive" => Some(GenericFamily::Cursive),
        "fantasy" => Some(GenericFamily::Fantasy),
        _ => None,
    }
}

// ── Family names ────────────────────────────────────────────────────

/// One entry of a font stack.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FamilyName {
    /// A concrete family, e.g. `Lobster`.
    Named(String),
    /// A generic keyword, e.g. `serif`.
    Generic(GenericFamily),
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Generic(generic) => f.write_str(generic.keyword()),
        }
    }
}

// ── Font stack ──────────────────────────────────────────────────────

/// Ordered fallback chain parsed from a `font-family` value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontStack {
    families: Vec<FamilyName>,
}

impl FontStack {
    /// Parse a comma-separated family list.
    ///
    /// Quotes around names are stripped and empty entries dropped. A stack
    /// with no usable entry falls back to `serif`.
    pub fn parse(css: &str) -> Self {
        let families: Vec<FamilyName> = css
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim_matches('\'').trim())
            .filter(|s| !s.is_empty())
            .map(|s| match parse_generic(s) {
                Some(generic) => FamilyName::Generic(generic),
                None => FamilyName::Named(s.to_string()),
            })
            .collect();

        Self {
            families: if families.is_empty() {
                vec![FamilyName::Generic(GenericFamily::Serif)]
            } else {
                families
            },
        }
    }

    pub fn families(&self) -> &[FamilyName] {
        &self.families
    }

    /// First generic keyword in the stack, or `serif`.
    pub fn generic_fallback(&self) -> GenericFamily {
        self.families
            .iter()
            .find_map(|f| match f {
                FamilyName::Generic(g) => Some(*g),
                FamilyName::Named(_) => None,
            })
            .unwrap_or(GenericFamily::Serif)
    }
}

impl fmt::Display for FontStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, family) in self.families.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{family}")?;
        }
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_stack() {
        let stack = FontStack::parse("Lobster, serif");
        assert_eq!(
            stack.families(),
            &[
                FamilyName::Named("Lobster".into()),
                FamilyName::Generic(GenericFamily::Serif)
            ]
        );
    }

    #[test]
    fn test_parse_quoted() {
        let stack = FontStack::parse("\"Times New Roman\", 'Open Sans', serif");
        assert_eq!(
            stack.families(),
            &[
                FamilyName::Named("Times New Roman".into()),
                FamilyName::Named("Open Sans".into()),
                FamilyName::Generic(GenericFamily::Serif)
            ]
        );
    }

    #[test]
    fn test_parse_empty_falls_back_to_serif() {
        assert_eq!(FontStack::parse("").families(), &[FamilyName::Generic(GenericFamily::Serif)]);
        assert_eq!(FontStack::parse(" , ,").generic_fallback(), GenericFamily::Serif);
    }

    #[test]
    fn test_generic_fallback_picks_first_generic() {
        let stack = FontStack::parse("Foo, monospace, serif");
        assert_eq!(stack.generic_fallback(), GenericFamily::Monospace);
        assert_eq!(FontStack::parse("Foo").generic_fallback(), GenericFamily::Serif);
    }

    #[test]
    fn test_display_roundtrip_normalizes() {
        let stack = FontStack::parse("  Lobster ,SERIF ");
        assert_eq!(stack.to_string(), "Lobster, serif");
    }

    #[test]
    fn test_parse_generic() {
        assert_eq!(parse_generic("serif"), Some(GenericFamily::Serif));
        assert_eq!(parse_generic("Sans-Serif"), Some(GenericFamily::SansSerif));
        assert_eq!(parse_generic("monospace"), Some(GenericFamily::Monospace));
        assert_eq!(parse_generic("cursive"), Some(GenericFamily::Cursive));
        assert_eq!(parse_generic("fantasy"), Some(GenericFamily::Fantasy));
        assert_eq!(parse_generic("arial"), None);
    }

    #[test]
    fn test_keyword_matches_parse() {
        for generic in [
            GenericFamily::Serif,
            GenericFamily::SansSerif,
            GenericFamily::Monospace,
            GenericFamily::Cursive,
            GenericFamily::Fantasy,
        ] {
            assert_eq!(parse_generic(generic.keyword()), Some(generic));
        }
    }
}
