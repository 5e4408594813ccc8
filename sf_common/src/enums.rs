use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

/// Implements `Display`, `FromStr` and `TryFrom<String>` for a fieldless enum, using the given string for each variant.
///
/// These enums are stored as TEXT columns, so the strings must match the enum's serde representation.
#[macro_export]
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($s),)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err($crate::ConversionError(format!("Invalid {}: {other}", stringify!($name)))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::ConversionError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}
