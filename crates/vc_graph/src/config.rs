use alloc::borrow::Cow;
use alloc::string::String;

// -----------------------------------------------------------------------------
// NameStyle

/// How struct member names are written to documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameStyle {
    /// Use the member name exactly as declared.
    #[default]
    AsDeclared,
    /// Convert `snake_case` member names to `camelCase`.
    CamelCase,
}

impl NameStyle {
    /// Applies the style to a declared member name.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_graph::NameStyle;
    ///
    /// assert_eq!(NameStyle::CamelCase.apply("max_hit_points"), "maxHitPoints");
    /// assert_eq!(NameStyle::AsDeclared.apply("max_hit_points"), "max_hit_points");
    /// ```
    pub fn apply(self, name: &'static str) -> Cow<'static, str> {
        match self {
            Self::AsDeclared => Cow::Borrowed(name),
            Self::CamelCase if !name.contains('_') => Cow::Borrowed(name),
            Self::CamelCase => {
                let mut out = String::with_capacity(name.len());
                let mut upper = false;
                for ch in name.trim_start_matches('_').chars() {
                    if ch == '_' {
                        upper = !out.is_empty();
                    } else if upper {
                        out.extend(ch.to_uppercase());
                        upper = false;
                    } else {
                        out.push(ch);
                    }
                }
                Cow::Owned(out)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Config

/// Tunables of a [`Serializer`](crate::Serializer).
///
/// Every field defaults to the most conservative behavior.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Naming of struct members in documents.
    pub member_names: NameStyle,
    /// Write unit enums as their variant index instead of the variant name.
    ///
    /// Both forms are always accepted when reading.
    pub enums_as_integers: bool,
    /// Write 64-bit integers as decimal strings.
    ///
    /// Some document consumers store every number as a double and cannot
    /// represent the full range. Both forms are always accepted when reading.
    pub wide_integers_as_strings: bool,
    /// Treat recoverable problems as hard failures.
    ///
    /// By default, a member that cannot be read or an invalid type tag only
    /// produces a warning.
    pub strict: bool,
}
