//! Macro for implementing Display and FromStr for unit-variant domain enums
//!
//! Keeps the string form used by storage, configuration and the HTTP surface
//! in one place per enum. Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use questlog_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Difficulty {
//!     Easy,
//!     Hard,
//! }
//!
//! impl_domain_enum_conversions!(Difficulty {
//!     Easy => "easy",
//!     Hard => "hard",
//! });
//!
//! assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
//! ```

/// Implements Display and FromStr traits for unit-variant enums
///
/// Display writes the lowercase mapping; FromStr accepts any casing and
/// reports the enum name on failure.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
