//! Validation-focused tests for configuration

#[cfg(test)]
mod validation_tests {
    use crate::config::Config;
    use crate::Error;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.bucket, "cloudlock");
        assert_eq!(config.storage.endpoint, "https://storage.googleapis.com");
        assert_eq!(config.storage.request_timeout_secs, 30);
        assert_eq!(config.wait.poll_interval_secs, 5);
        assert_eq!(config.wait.timeout_secs, None);
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_blank_bucket_rejected() {
        let config = Config {
            bucket: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = Config::default();
        for (secs, valid) in [(0, false), (1, true), (3600, true), (3601, false)] {
            config.wait.poll_interval_secs = secs;
            assert_eq!(config.validate().is_ok(), valid, "poll interval {secs}");
        }
    }

    #[test]
    fn test_wait_timeout_upper_bound() {
        use crate::config::MAX_WAIT_TIMEOUT_SECS;

        let mut config = Config::default();
        for (secs, valid) in [
            (0, true),
            (MAX_WAIT_TIMEOUT_SECS, true),
            (MAX_WAIT_TIMEOUT_SECS + 1, false),
            (u64::MAX, false),
        ] {
            config.wait.timeout_secs = Some(secs);
            assert_eq!(config.validate().is_ok(), valid, "wait timeout {secs}");
        }
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let mut config = Config::default();
        config.storage.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_scheme_required() {
        let mut config = Config::default();
        config.storage.endpoint = "storage.googleapis.com".to_string();
        assert!(config.validate().is_err());

        config.storage.endpoint = "http://localhost:4443".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_access_token_never_serialized() -> Result<(), toml::ser::Error> {
        let mut config = Config::default();
        config.storage.access_token = Some("secret".to_string());
        let rendered = toml::to_string(&config)?;
        assert!(!rendered.contains("secret"));
        Ok(())
    }
}
