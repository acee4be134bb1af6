use crate::error::{SizeRejection, ValidationError};
use crate::models::GalleryConfig;
use regex::Regex;

/// Accepted type and size policy for uploaded media
#[derive(Debug, Clone)]
pub struct Validator {
    accepted_types: Regex,
    min_bytes: u64,
    max_bytes: u64,
}

impl Validator {
    pub fn new(accepted_types: &str, min_bytes: u64, max_bytes: u64) -> Result<Self, regex::Error> {
        Ok(Self {
            accepted_types: Regex::new(accepted_types)?,
            min_bytes,
            max_bytes,
        })
    }

    pub fn from_config(config: &GalleryConfig) -> Result<Self, regex::Error> {
        Self::new(&config.accepted_types, config.min_bytes, config.max_bytes)
    }

    /// Checks a detected format tag against the accepted type pattern
    pub fn validate_type(&self, format_tag: &str) -> Result<(), ValidationError> {
        if self.accepted_types.is_match(format_tag) {
            Ok(())
        } else {
            Err(ValidationError::TypeRejected(format_tag.to_string()))
        }
    }

    /// Checks a payload size against `[min_bytes, max_bytes]`
    pub fn validate_size(&self, byte_count: u64) -> Result<(), ValidationError> {
        if byte_count < self.min_bytes {
            Err(ValidationError::SizeRejected {
                kind: SizeRejection::TooSmall,
                size: byte_count,
            })
        } else if byte_count > self.max_bytes {
            Err(ValidationError::SizeRejected {
                kind: SizeRejection::TooLarge,
                size: byte_count,
            })
        } else {
            Ok(())
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_types() {
        let validator = Validator::from_config(&GalleryConfig::default()).unwrap();
        for tag in ["gif", "jpeg", "pjpeg", "png", "x-png"] {
            assert!(validator.validate_type(tag).is_ok(), "{} should pass", tag);
        }
        for tag in ["bmp", "webp", "tiff", "", "jpegxl", "svg+png"] {
            assert_eq!(
                validator.validate_type(tag),
                Err(ValidationError::TypeRejected(tag.to_string()))
            );
        }
    }

    #[test]
    fn test_size_boundaries() {
        let validator = Validator::from_config(&GalleryConfig::default()).unwrap();
        let max = validator.max_bytes();

        assert!(validator.validate_size(1).is_ok());
        assert!(validator.validate_size(max).is_ok());
        assert_eq!(
            validator.validate_size(0),
            Err(ValidationError::SizeRejected {
                kind: SizeRejection::TooSmall,
                size: 0
            })
        );
        assert_eq!(
            validator.validate_size(max + 1),
            Err(ValidationError::SizeRejected {
                kind: SizeRejection::TooLarge,
                size: max + 1
            })
        );
    }

    #[test]
    fn test_custom_policy() {
        let validator = Validator::new("^png$", 10, 20).unwrap();
        assert!(validator.validate_type("png").is_ok());
        assert!(validator.validate_type("gif").is_err());
        assert!(validator.validate_size(9).is_err());
        assert!(validator.validate_size(20).is_ok());
        assert!(validator.validate_size(21).is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Validator::new("(unclosed", 1, 2).is_err());
    }
}
