//! Non-fatal conditions raised while parsing data points.

/// A recoverable anomaly found while decoding a data point.
///
/// Warnings never abort decoding. The offending value is replaced and the
/// warning is reported through logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// The sample value was `+Inf` or `-Inf`.
    Inf,
    /// The sample value was `NaN`.
    NaN,
}

impl Warning {
    /// Returns the fixed message for this warning.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Inf => "Found Inf value parsing vector data point for metric",
            Self::NaN => "Found NaN value parsing vector data point for metric",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
