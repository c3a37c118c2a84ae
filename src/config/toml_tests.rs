//! Tests for TOML configuration parsing.

use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.monitor.max_age.is_none());
        assert!(config.filter.include.is_empty());
        assert!(config.output.framing.is_none());
    }

    #[test]
    fn parse_monitor_section() {
        let toml = r"
            [monitor]
            max_age = 1000
            lookup_timeout = 2000
        ";

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.monitor.max_age, Some(1000));
        assert_eq!(config.monitor.lookup_timeout, Some(2000));
    }

    #[test]
    fn parse_filter_section() {
        let toml = r#"
            [filter]
            include = ["^eth", "^wlan"]
            exclude = ["^docker", "^veth"]
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let filter = &config.filter;

        assert_eq!(filter.include, vec!["^eth", "^wlan"]);
        assert_eq!(filter.exclude, vec!["^docker", "^veth"]);
    }

    #[test]
    fn parse_output_section() {
        let toml = r#"
            [output]
            framing = "record-separator"
            warnings = false
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.output.framing.as_deref(), Some("record-separator"));
        assert_eq!(config.output.warnings, Some(false));
    }
}

mod errors {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r"
            [monitor]
            poll_interval = 60
        ";

        let result = TomlConfig::parse(toml);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_section_is_rejected() {
        let result = TomlConfig::parse("[metrics]\nport = 9000\n");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = TomlConfig::parse("[monitor]\nmax_age = \"fast\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::path::Path::new("definitely/not/here.toml");
        let error = TomlConfig::load(path).unwrap_err();

        assert!(matches!(error, ConfigError::FileRead { .. }));
        assert!(error.to_string().contains("here.toml"));
    }
}

mod template {
    use super::*;

    #[test]
    fn template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(config.monitor.max_age, Some(250));
        assert_eq!(config.output.framing.as_deref(), Some("line"));
    }

    #[test]
    fn template_mentions_every_framing() {
        let template = default_config_template();
        for name in ["line", "length-prefixed", "concatenated", "record-separator"] {
            assert!(template.contains(name), "missing {name}");
        }
    }
}
