#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::{CliError, ConfigError};
    use figment::Jail;
    use std::path::Path;

    fn load(overrides: &ConfigOverrides) -> figment::Result<DevloopConfig> {
        DevloopConfig::load(None, overrides).map_err(|e| e.to_string().into())
    }

    #[test]
    fn test_defaults() {
        let config = DevloopConfig::default();
        assert_eq!(config.serve.listen, ":3000");
        assert!(config.serve.live);
        assert!(config.serve.open);
        assert!(config.serve.include.is_empty());
        assert_eq!(config.serve.debounce_ms, 100);
        assert!(config.watch.clear);
        assert!(config.watch.exclude.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let parsed: DevloopConfig = toml_from_str(&DevloopConfig::example_config());
        assert_eq!(parsed, DevloopConfig::default());
    }

    fn toml_from_str(text: &str) -> DevloopConfig {
        use figment::providers::{Format, Toml};
        figment::Figment::from(Toml::string(text)).extract().unwrap()
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        Jail::expect_with(|_| {
            assert_eq!(load(&ConfigOverrides::default())?, DevloopConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [serve]
                listen = "localhost:8080"
                open = false
                exclude = ["*.tmp"]

                [watch]
                clear = false
                "#,
            )?;

            let config = load(&ConfigOverrides::default())?;
            assert_eq!(config.serve.listen, "localhost:8080");
            assert!(!config.serve.open);
            assert!(config.serve.live);
            assert_eq!(config.serve.exclude, vec!["*.tmp".to_string()]);
            assert!(!config.watch.clear);
            Ok(())
        });
    }

    #[test]
    fn test_priority_cli_over_env_over_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[serve]\nlisten = \":4000\"\ndebounce_ms = 50\n")?;
            jail.set_env("DEVLOOP_SERVE__LISTEN", ":5000");
            jail.set_env("DEVLOOP_SERVE__DEBOUNCE_MS", "250");

            let config = load(&ConfigOverrides::default())?;
            assert_eq!(config.serve.listen, ":5000");
            assert_eq!(config.serve.debounce_ms, 250);

            let overrides = ConfigOverrides {
                serve: ServeOverrides {
                    listen: Some(":6000".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            let config = load(&overrides)?;
            assert_eq!(config.serve.listen, ":6000");
            assert_eq!(config.serve.debounce_ms, 250);
            Ok(())
        });
    }

    #[test]
    fn test_unrelated_env_is_ignored() {
        Jail::expect_with(|jail| {
            jail.set_env("DEVLOOP_CONFIG", "elsewhere.toml");
            jail.set_env("DEVLOOP_TOKEN", "x");
            assert_eq!(load(&ConfigOverrides::default())?, DevloopConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[serve]\nport = 3000\n")?;
            let err = DevloopConfig::load(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::Load(_))));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let err = DevloopConfig::load(
            Some(Path::new("/definitely/not/here/devloop.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_explicit_config_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[watch]\ninclude = [\"*.go\"]\n")?;
            let config = DevloopConfig::load(Some(Path::new("custom.toml")), &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.watch.include, vec!["*.go".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_validation() {
        let mut config = DevloopConfig::default();
        config.serve.listen = "3000".to_string();
        assert!(matches!(
            config.validate(),
            Err(CliError::Config(ConfigError::InvalidListenAddress { .. }))
        ));

        let mut config = DevloopConfig::default();
        config.watch.include = vec!["[".to_string()];
        assert!(matches!(
            config.validate(),
            Err(CliError::Config(ConfigError::InvalidPattern { .. }))
        ));

        let mut config = DevloopConfig::default();
        config.serve.debounce_ms = 5;
        assert!(matches!(
            config.validate(),
            Err(CliError::Config(ConfigError::InvalidValue { .. }))
        ));

        assert!(validate_debounce("watch.debounce_ms", 10).is_ok());
        assert!(validate_debounce("watch.debounce_ms", 10_000).is_ok());
        assert!(validate_debounce("watch.debounce_ms", 10_001).is_err());
    }

    #[test]
    fn test_invalid_value_from_env_fails_load() {
        Jail::expect_with(|jail| {
            jail.set_env("DEVLOOP_WATCH__DEBOUNCE_MS", "1");
            let err = DevloopConfig::load(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::InvalidValue { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_serve_config_to_dev_config() {
        let serve = ServeConfig {
            listen: "127.0.0.1:8000".to_string(),
            live: false,
            include: vec!["*.html".to_string()],
            ..ServeConfig::default()
        };
        let dev = serve.to_dev_config("public").unwrap();
        assert_eq!(dev.listen.host, "127.0.0.1");
        assert_eq!(dev.listen.port, 8000);
        assert!(!dev.live);
        assert!(dev.open);
        assert!(dev.filter.accepts("index.html"));
        assert!(!dev.filter.accepts("style.css"));
        assert_eq!(dev.root, std::path::PathBuf::from("public"));
    }
}
