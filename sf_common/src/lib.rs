mod cents;
mod enums;
pub mod helpers;
pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, DEFAULT_CURRENCY_CODE};
pub use enums::ConversionError;
pub use secret::Secret;
