//! Keyword enums shared by the config file, the CLI and the wire format.

/// Implement `as_str`, `Display` and case-insensitive `FromStr` for a
/// fieldless enum whose variants each map to one lowercase keyword.
///
/// ```rust,ignore
/// keyword_enum!(SortDir, GridError::InvalidSortDir, {
///     Asc => "asc",
///     Desc => "desc",
/// });
/// ```
#[macro_export]
macro_rules! keyword_enum {
    (
        $name:ident,
        $error:path,
        { $($variant:ident => $keyword:literal),+ $(,)? }
    ) => {
        impl $name {
            /// Every accepted keyword, in declaration order.
            pub const KEYWORDS: &'static [&'static str] = &[$($keyword),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $keyword,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::GridError;

            fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
                let keyword = raw.trim().to_ascii_lowercase();
                $(
                    if keyword == $keyword {
                        return Ok($name::$variant);
                    }
                )+
                Err($error(raw.to_string()))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::{GridError, Result};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shade {
        Light,
        Dark,
    }

    // `Result` is the crate alias here, as at every real call site.
    keyword_enum!(Shade, GridError::Other, { Light => "light", Dark => "dark_mode" });

    fn parse(raw: &str) -> Result<Shade> {
        raw.parse()
    }

    #[test]
    fn test_keywords_round_trip() {
        assert_eq!(Shade::KEYWORDS, &["light", "dark_mode"]);
        for keyword in Shade::KEYWORDS {
            assert_eq!(parse(keyword).unwrap().as_str(), *keyword);
        }
        assert_eq!(Shade::Dark.to_string(), "dark_mode");
    }

    #[test]
    fn test_parse_ignores_case_and_padding() {
        assert_eq!(parse(" LIGHT ").unwrap(), Shade::Light);
        assert!(matches!(parse("dim"), Err(GridError::Other(raw)) if raw == "dim"));
    }
}
