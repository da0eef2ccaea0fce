//! Error message formatting with actionable suggestions.

use monstera_core::error::MonsteraError;
use std::error::Error;

use super::colors::ColorSupport;

/// Renders a [`MonsteraError`] with its API details, a hint and its causes
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    pub fn format_error(&self, error: &MonsteraError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        if let Some(failure) = error.api_failure() {
            let request = match (&failure.method, &failure.url) {
                (Some(method), Some(url)) => Some(format!("{} {}", method, url)),
                (None, Some(url)) => Some(url.clone()),
                _ => None,
            };
            if let Some(request) = request {
                output.push_str(&format!("{} {}\n", self.colors.dim("-->"), request));
            }
            output.push_str(&format!(
                "{} {} (status {})\n",
                self.colors.dim("code:"),
                failure.code,
                failure.status
            ));
        }

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&format!("{}: {}\n", self.colors.dim("help"), suggestion));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("\n{}: {}", self.colors.dim("caused by"), err));
            source = err.source();
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
