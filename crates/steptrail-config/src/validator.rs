//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert into the first error, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_observer(config, &mut result);
        Self::validate_transport(config, &mut result);
        Self::validate_envelope(config, &mut result);

        result
    }

    fn validate_observer(config: &Config, result: &mut ValidationResult) {
        let observer = &config.observer;

        if observer.critical_window_ms == 0 {
            result.add_error(ValidationError::new(
                "observer.critical_window_ms",
                "critical_window_ms must be greater than 0",
            ));
        }

        if observer.enter_window_ms == 0 {
            result.add_error(ValidationError::new(
                "observer.enter_window_ms",
                "enter_window_ms must be greater than 0",
            ));
        }

        if observer.delivery_delays_ms.is_empty() {
            result.add_error(ValidationError::new(
                "observer.delivery_delays_ms",
                "at least one delivery attempt is required",
            ));
        } else if observer.delivery_delays_ms.len() > u8::MAX as usize {
            result.add_error(ValidationError::new(
                "observer.delivery_delays_ms",
                "too many delivery attempts",
            ));
        }

        if observer
            .delivery_delays_ms
            .windows(2)
            .any(|pair| pair[1] <= pair[0])
        {
            result.add_error(ValidationError::new(
                "observer.delivery_delays_ms",
                "delivery delays must be strictly increasing",
            ));
        }

        if observer.enter_window_ms < observer.critical_window_ms {
            result.add_warning(ValidationWarning::new(
                "observer.enter_window_ms",
                "enter_window_ms is shorter than critical_window_ms; repeated Enter presses may slip through",
            ));
        }

        if observer.settle_delay_ms < observer.rescan_delay_ms {
            result.add_warning(ValidationWarning::new(
                "observer.settle_delay_ms",
                "settle_delay_ms is shorter than rescan_delay_ms; late content may be attributed to interactions",
            ));
        }
    }

    fn validate_transport(config: &Config, result: &mut ValidationResult) {
        let transport = &config.transport;

        match url::Url::parse(&transport.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(_) => result.add_error(ValidationError::new(
                "transport.base_url",
                "base_url must start with http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "transport.base_url",
                format!("base_url is not a valid URL: {}", e),
            )),
        }

        for (name, path) in [
            ("transport.save_path", &transport.save_path),
            ("transport.image_path", &transport.image_path),
            ("transport.refresh_path", &transport.refresh_path),
        ] {
            if !path.starts_with('/') {
                result.add_error(ValidationError::new(name, "path must start with '/'"));
            }
        }

        if transport.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "transport.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_envelope(config: &Config, result: &mut ValidationResult) {
        if config.envelope.iterations == 0 {
            result.add_error(ValidationError::new(
                "envelope.iterations",
                "iterations must be greater than 0",
            ));
        }

        if config.envelope.salt.is_empty() {
            result.add_error(ValidationError::new(
                "envelope.salt",
                "salt cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
