use std::collections::BTreeMap;
use std::time::Duration;

use shapefig::{
    CoproductHint, ConfigCursor, ConfigValue, ConverterRegistry, FailureReason, ProductHint,
    ReadConfig, Reader, Shapefig, ShapefigError, WriteConfig, from_toml_str, to_toml_string,
};

shapefig::config_enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum LogLevel {
        Debug,
        Info,
        Warn,
    }
}

shapefig::config_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Database {
        pub url: String,
        pub pool_size: u32 = 5,
        pub timeout: Duration = Duration::from_secs(30),
    }
}

shapefig::config_enum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Storage {
        Memory,
        Disk { path: std::path::PathBuf, sync: bool = false },
    }
}

shapefig::config_record! {
    /// Top-level application settings.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AppConfig {
        pub name: String,
        pub log_level: LogLevel = LogLevel::Info,
        pub database: Database,
        pub storage: Storage = Storage::Memory,
        pub replicas: Vec<String> = Vec::new(),
        pub labels: BTreeMap<String, String> = BTreeMap::new(),
        pub motd: Option<String>,
    }
}

const FULL: &str = r#"
name = "demo"
log-level = "warn"
replicas = ["a", "b"]

[database]
url = "postgres://localhost"
pool-size = 10
timeout = "1m"

[storage]
type = "disk"
path = "/var/lib/demo"

[labels]
team = "core"
"#;

#[test]
fn reads_full_document() {
    let config: AppConfig = from_toml_str(FULL).unwrap();
    assert_eq!(config.name, "demo");
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.database.pool_size, 10);
    assert_eq!(config.database.timeout, Duration::from_secs(60));
    assert_eq!(
        config.storage,
        Storage::Disk {
            path: "/var/lib/demo".into(),
            sync: false
        }
    );
    assert_eq!(config.replicas, vec!["a", "b"]);
    assert_eq!(config.labels.get("team").map(String::as_str), Some("core"));
    assert_eq!(config.motd, None);
}

#[test]
fn defaults_fill_absent_keys() {
    let config: AppConfig =
        from_toml_str("name = \"x\"\n[database]\nurl = \"u\"\n").unwrap();
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.database.pool_size, 5);
    assert_eq!(config.storage, Storage::Memory);
}

#[test]
fn all_failures_are_reported_together() {
    let text = "log-level = \"loud\"\n[database]\npool-size = \"many\"\n";
    let err = from_toml_str::<AppConfig>(text).unwrap_err();
    let ShapefigError::Read(failures) = err else {
        panic!("Expected read failures");
    };
    let mut paths: Vec<String> = failures.iter().map(|f| f.path().to_string()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec!["database.pool-size", "database.url", "log-level", "name"]
    );
}

#[test]
fn unknown_discriminator_lists_variants() {
    let text = "name = \"x\"\n[database]\nurl = \"u\"\n[storage]\ntype = \"cloud\"\n";
    let err = from_toml_str::<AppConfig>(text).unwrap_err();
    let ShapefigError::Read(failures) = err else {
        panic!("Expected read failures");
    };
    match failures.first().reason() {
        FailureReason::UnexpectedDiscriminator { value, expected } => {
            assert_eq!(value, "cloud");
            assert_eq!(expected, &vec!["memory".to_string(), "disk".to_string()]);
        }
        other => panic!("Expected UnexpectedDiscriminator, got: {other:?}"),
    }
}

#[test]
fn written_document_reads_back() {
    let config: AppConfig = from_toml_str(FULL).unwrap();
    let text = to_toml_string(&config).unwrap();
    assert!(text.contains("log-level = \"warn\""));
    assert!(!text.contains("motd"));
    assert_eq!(from_toml_str::<AppConfig>(&text).unwrap(), config);
}

#[test]
fn registry_hints_change_policy() {
    let registry = ConverterRegistry::new()
        .with_product_hint::<Database>(ProductHint::default().allow_unknown_keys(false))
        .with_coproduct_hint::<Storage>(CoproductHint::field("kind"));
    let text = r#"
name = "x"
[database]
url = "u"
pool_size = 3
[storage]
kind = "memory"
"#;
    let err = Shapefig::builder()
        .toml_str("strict.toml", text)
        .registry(registry)
        .load::<AppConfig>()
        .unwrap_err();
    let ShapefigError::Read(failures) = err else {
        panic!("Expected read failures");
    };
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures.first().reason(),
        FailureReason::UnknownKey { key } if key == "pool_size"
    ));
}

#[test]
fn user_types_implement_the_traits() {
    #[derive(Debug, PartialEq)]
    struct Percent(u8);

    impl ReadConfig for Percent {
        fn read_config(cursor: &ConfigCursor<'_>) -> shapefig::ReadResult<Self> {
            Reader::<u8>::of()
                .ensure(|p| *p <= 100, |p| format!("{p} is more than 100"))
                .map(Percent)
                .read(cursor)
        }
    }

    impl WriteConfig for Percent {
        fn write_with(&self, _ctx: &shapefig::WriteContext<'_>) -> ConfigValue {
            ConfigValue::from(self.0)
        }
    }

    let value = ConfigValue::from(40);
    assert_eq!(Percent::read_config(&ConfigCursor::new(&value)).unwrap(), Percent(40));
    let too_much = ConfigValue::from(140);
    assert!(ConfigCursor::new(&too_much).read::<Percent>().is_err());
    assert_eq!(Percent(3).write_config(), ConfigValue::from(3));
}
