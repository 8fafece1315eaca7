//! Error types for the quadrature driver.

use core::fmt;

/// Errors returned by channel construction and channel operations.
///
/// `E` is the error type of the board's [`LineConfig`](crate::traits::LineConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadratureError<E> {
    /// Every hardware channel has already been claimed.
    ResourceExhausted,

    /// The handle never received a hardware channel.
    InvalidChannel,

    /// The pin configurator failed to set up a decoder input line.
    Line(E),
}

// Allow ergonomic `?` propagation from line configuration results.
impl<E> From<E> for QuadratureError<E> {
    fn from(error: E) -> Self {
        QuadratureError::Line(error)
    }
}

impl<E: fmt::Debug> fmt::Display for QuadratureError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuadratureError::ResourceExhausted => write!(
                f,
                "all {} quadrature channels are in use",
                crate::registry::MAX_CHANNELS
            ),
            QuadratureError::InvalidChannel => write!(f, "quadrature handle has no channel"),
            QuadratureError::Line(e) => write!(f, "line configuration error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for QuadratureError<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for QuadratureError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            QuadratureError::ResourceExhausted => defmt::write!(f, "Quadrature channels exhausted"),
            QuadratureError::InvalidChannel => defmt::write!(f, "Invalid quadrature channel"),
            QuadratureError::Line(e) => defmt::write!(f, "Line error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn from_line_error() {
        let err: QuadratureError<u8> = 7u8.into();
        assert_eq!(err, QuadratureError::Line(7));
    }

    #[test]
    fn display_messages() {
        let exhausted: QuadratureError<()> = QuadratureError::ResourceExhausted;
        assert_eq!(exhausted.to_string(), "all 6 quadrature channels are in use");

        let invalid: QuadratureError<()> = QuadratureError::InvalidChannel;
        assert_eq!(invalid.to_string(), "quadrature handle has no channel");

        let line: QuadratureError<&str> = QuadratureError::Line("busy");
        assert_eq!(line.to_string(), "line configuration error: \"busy\"");
    }
}
