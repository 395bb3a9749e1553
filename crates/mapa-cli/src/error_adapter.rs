//! Error adapter for converting MapaError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use mapa::MapaError;

/// Adapter rendering a [`MapaError`] as a miette diagnostic.
///
/// Every variant gets a stable code; some also carry a hint.
pub struct ErrorAdapter<'a>(pub &'a MapaError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            MapaError::Io(_) => "mapa::io",
            MapaError::Json(_) => "mapa::json",
            MapaError::Catalogue(_) => "mapa::catalogue",
            MapaError::Schema(_) => "mapa::schema",
            MapaError::Atlas(_) => "mapa::atlas",
            MapaError::Config(_) => "mapa::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            MapaError::Json(_) => "scene files hold `map_default`, `schemas` and `features`",
            MapaError::Catalogue(_) => {
                "icon libraries map names to `{ label, svgs: { variant: { svg } } }`"
            }
            MapaError::Schema(_) => "field and symbol ids must be unique within a schema",
            MapaError::Io(_) | MapaError::Atlas(_) | MapaError::Config(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use mapa::atlas::AtlasError;

    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = MapaError::Atlas(AtlasError::CanvasUnavailable);
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "mapa::atlas");
        assert!(adapter.help().is_none());
        assert_eq!(adapter.to_string(), "Atlas error: atlas canvas is unavailable");
    }

    #[test]
    fn test_config_error() {
        let err = MapaError::Config("bad padding".to_string());
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "mapa::config");
        assert_eq!(adapter.to_string(), "Configuration error: bad padding");
    }

    #[test]
    fn test_json_error_has_help() {
        let err = MapaError::from(serde_json::from_str::<u32>("nope").unwrap_err());
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "mapa::json");
        assert!(adapter.help().is_some());
    }
}
