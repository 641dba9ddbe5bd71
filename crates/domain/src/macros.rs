//! Macro for implementing Display and FromStr for simple domain enums
//!
//! Providers and session states travel through URLs, storage keys and JSON.
//! The macro gives them one canonical lowercase spelling and a
//! case-insensitive parser.
//!
//! # Example
//!
//! ```rust
//! use moodmix_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Quality {
//!     Low,
//!     High,
//! }
//!
//! impl_domain_enum_conversions!(Quality {
//!     Low => "low",
//!     High => "high",
//! });
//!
//! assert_eq!(Quality::High.to_string(), "high");
//! assert_eq!("LOW".parse::<Quality>().unwrap(), Quality::Low);
//! ```

/// Implements `Display` and `FromStr` for unit-variant enums.
///
/// `Display` writes the mapped string; `FromStr` lowercases its input before
/// matching and reports the enum name on failure.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::MoodmixError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::MoodmixError::InvalidInput(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}
