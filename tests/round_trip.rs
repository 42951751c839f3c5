//! Property tests: anything written out reads back to the same value.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use proptest::prelude::*;
use shapefig::{from_toml_str, from_value, to_toml_string, to_value};

shapefig::config_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Sample {
        pub count: i64,
        pub ratio: f64,
        pub enabled: bool,
        pub marker: char,
        pub name: String,
        pub path: PathBuf,
        pub timeout: Duration,
        pub retries: Option<u32>,
        pub weights: Vec<i32>,
        pub labels: BTreeMap<String, String>,
    }
}

prop_compose! {
    fn sample()(
        count in any::<i64>(),
        ratio in any::<f64>().prop_filter("finite", |v| v.is_finite()),
        enabled in any::<bool>(),
        marker in any::<char>().prop_filter("printable", |c| !c.is_control()),
        name in "\\PC*",
        path in "\\PC*",
        secs in 0u64..1_000_000_000,
        nanos in 0u32..1_000_000_000,
        retries in proptest::option::of(any::<u32>()),
        weights in prop::collection::vec(any::<i32>(), 0..6),
        labels in prop::collection::btree_map("[a-z][a-z0-9-]{0,8}", "\\PC*", 0..4),
    ) -> Sample {
        Sample {
            count,
            ratio,
            enabled,
            marker,
            name,
            path: PathBuf::from(path),
            timeout: Duration::new(secs, nanos),
            retries,
            weights,
            labels,
        }
    }
}

proptest! {
    #[test]
    fn written_tree_reads_back(value in sample()) {
        let read: Sample = from_value(&to_value(&value)).unwrap();
        prop_assert_eq!(read, value);
    }

    #[test]
    fn written_toml_reads_back(value in sample()) {
        let text = to_toml_string(&value).unwrap();
        let read: Sample = from_toml_str(&text).unwrap();
        prop_assert_eq!(read, value);
    }

    #[test]
    fn durations_read_back_exactly(secs in 0u64..1_000_000_000_000, nanos in 0u32..1_000_000_000) {
        let duration = Duration::new(secs, nanos);
        let read: Duration = from_value(&to_value(&duration)).unwrap();
        prop_assert_eq!(read, duration);
    }
}
