//! Loading-focused tests for configuration
//!
//! File parsing, layering, path resolution, and environment overrides.

#[cfg(test)]
mod loading_tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use crate::config::{global_config_path, load_config, load_toml_file, Config};
    use crate::{Error, Result};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn write_config(dir: &tempfile::TempDir, content: &str) -> Result<std::path::PathBuf> {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok(path)
    }

    #[test]
    fn test_load_full_toml_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(
            &dir,
            r#"
bucket = "ci-locks"
project_id = "my-project"
region = "europe-west1"

[storage]
endpoint = "http://localhost:4443"
request_timeout_secs = 10

[wait]
poll_interval_secs = 2
timeout_secs = 600
"#,
        )?;

        let config = load_toml_file(&path)?;
        assert_eq!(config.bucket, "ci-locks");
        assert_eq!(config.project_id.as_deref(), Some("my-project"));
        assert_eq!(config.region.as_deref(), Some("europe-west1"));
        assert_eq!(config.storage.endpoint, "http://localhost:4443");
        assert_eq!(config.storage.request_timeout_secs, 10);
        assert_eq!(config.wait.poll_interval_secs, 2);
        assert_eq!(config.wait.timeout_secs, Some(600));
        Ok(())
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(&dir, "bucket = \"other\"\n")?;

        let config = load_toml_file(&path)?;
        assert_eq!(config.bucket, "other");
        assert_eq!(config.storage, Config::default().storage);
        assert_eq!(config.wait, Config::default().wait);
        Ok(())
    }

    #[test]
    fn test_malformed_toml_returns_parse_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(&dir, "bucket = \n invalid toml [[[")?;

        let result = load_toml_file(&path);
        assert!(matches!(result, Err(Error::Parse(_))));
        Ok(())
    }

    #[test]
    fn test_directory_path_is_io_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = load_toml_file(dir.path());
        assert!(matches!(result, Err(Error::Io(ref msg)) if msg.contains("directory")));
        Ok(())
    }

    #[test]
    fn test_global_config_path_ends_with_config_toml() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("cloudlock"));
        }
    }

    #[test]
    fn test_env_overrides_every_field() -> Result<()> {
        let config = Config::default().apply_env(env(&[
            ("GCP_PROJECT_ID", "proj"),
            ("GCP_REGION", "us-east1"),
            ("GCP_SERVICE_ACCOUNT", "locker@proj.iam.gserviceaccount.com"),
            ("CLOUDLOCK_BUCKET", "env-bucket"),
            ("CLOUDLOCK_GCS_ENDPOINT", "http://127.0.0.1:8080"),
            ("CLOUDLOCK_ACCESS_TOKEN", "tok"),
            ("CLOUDLOCK_POLL_INTERVAL_SECS", "3"),
            ("CLOUDLOCK_WAIT_TIMEOUT_SECS", "90"),
        ]))?;

        assert_eq!(config.project_id.as_deref(), Some("proj"));
        assert_eq!(config.region.as_deref(), Some("us-east1"));
        assert_eq!(
            config.service_account.as_deref(),
            Some("locker@proj.iam.gserviceaccount.com")
        );
        assert_eq!(config.bucket, "env-bucket");
        assert_eq!(config.storage.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.storage.access_token.as_deref(), Some("tok"));
        assert_eq!(config.wait.poll_interval_secs, 3);
        assert_eq!(config.wait.timeout_secs, Some(90));
        Ok(())
    }

    #[test]
    fn test_empty_bucket_env_keeps_default() -> Result<()> {
        let config = Config::default().apply_env(env(&[("CLOUDLOCK_BUCKET", "")]))?;
        assert_eq!(config.bucket, "cloudlock");
        Ok(())
    }

    #[test]
    fn test_access_token_falls_back_to_google_variable() -> Result<()> {
        let config =
            Config::default().apply_env(env(&[("GOOGLE_OAUTH_ACCESS_TOKEN", "gcloud-token")]))?;
        assert_eq!(config.storage.access_token.as_deref(), Some("gcloud-token"));

        let config = Config::default().apply_env(env(&[
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "gcloud-token"),
            ("CLOUDLOCK_ACCESS_TOKEN", "own-token"),
        ]))?;
        assert_eq!(config.storage.access_token.as_deref(), Some("own-token"));
        Ok(())
    }

    #[test]
    fn test_unparsable_env_number_is_config_error() {
        let result =
            Config::default().apply_env(env(&[("CLOUDLOCK_POLL_INTERVAL_SECS", "soon")]));
        assert!(matches!(result, Err(Error::InvalidConfig(ref msg)) if msg.contains("CLOUDLOCK_POLL_INTERVAL_SECS")));
    }

    #[test]
    fn test_env_overrides_file_values() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(&dir, "bucket = \"file-bucket\"\nproject_id = \"file-proj\"\n")?;

        let config = Config::default()
            .merge(load_toml_file(&path)?)
            .apply_env(env(&[("CLOUDLOCK_BUCKET", "env-bucket")]))?;
        assert_eq!(config.bucket, "env-bucket");
        assert_eq!(config.project_id.as_deref(), Some("file-proj"));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_config_missing_explicit_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Io(ref msg)) if msg.contains("not found")));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_config_reads_process_environment() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(&dir, "bucket = \"file-bucket\"\n[wait]\npoll_interval_secs = 7\n")?;

        std::env::set_var("CLOUDLOCK_BUCKET", "process-env-bucket");
        let result = load_config(Some(&path));
        std::env::remove_var("CLOUDLOCK_BUCKET");

        let config = result?;
        assert_eq!(config.bucket, "process-env-bucket");
        assert_eq!(config.wait.poll_interval_secs, 7);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_load_config_validates_layered_values() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(&dir, "[wait]\npoll_interval_secs = 0\n")?;

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        Ok(())
    }
}
