use resolver::{
    FnConverter, OptionDescriptor, ResolverBuilder, StoreOperation, StoreOutcome, enum_option,
};
use std::time::Duration;
use testing::{MockStore, RecordingDiagnostics, WriteMode};

#[derive(Debug, Clone, PartialEq, strum::VariantArray, strum::VariantNames, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
enum Mode {
    Local,
    Remote,
}

enum_option!(Mode);

#[tokio::test]
async fn test_highest_priority_present_store_wins() {
    let first = MockStore::new("env").failing("db.host", "timeout").shared();
    let second = MockStore::new("secrets").shared();
    let third = MockStore::new("file").with_value("db.host", "file-host").shared();
    let fourth = MockStore::new("defaults").with_value("db.host", "default-host").shared();

    let resolver = ResolverBuilder::new()
        .store(first.clone())
        .store(second.clone())
        .store(third.clone())
        .store(fourth.clone())
        .build();

    let host = OptionDescriptor::<String>::new("db.host");
    let resolved = resolver.resolve(&host).await.unwrap();

    assert_eq!(resolved.value, "file-host");
    assert_eq!(resolved.source_index, Some(2));
    assert_eq!(first.reads(), 1);
    assert_eq!(second.reads(), 1);
    assert_eq!(third.reads(), 1);
    assert_eq!(fourth.reads(), 0);
}

#[tokio::test]
async fn test_store_errors_are_observable() {
    let diagnostics = RecordingDiagnostics::new();
    let resolver = ResolverBuilder::new()
        .store(MockStore::new("vault").unavailable("sealed"))
        .store(MockStore::new("file").with_value("api.key", "abc"))
        .diagnostics(diagnostics.clone())
        .build();

    let key = OptionDescriptor::<String>::new("api.key");
    assert_eq!(resolver.get(&key).await.unwrap(), "abc");

    let failures = diagnostics.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].option, "api.key");
    assert_eq!(failures[0].store_index, 0);
    assert_eq!(failures[0].store_name, "vault");
    assert_eq!(failures[0].operation, StoreOperation::Read);
    assert!(matches!(&failures[0].outcome, StoreOutcome::Failed(reason) if reason.contains("sealed")));
    assert_eq!(diagnostics.count(), 2);
}

#[tokio::test]
async fn test_get_within_timeout_hits_cache() {
    let store = MockStore::new("file").with_value("workers", "8").shared();
    let resolver = ResolverBuilder::new()
        .store(store.clone())
        .cache_timeout(Duration::from_secs(60))
        .build();

    let workers = OptionDescriptor::<u32>::new("workers");
    assert_eq!(resolver.get(&workers).await.unwrap(), 8);
    assert_eq!(resolver.get(&workers).await.unwrap(), 8);
    assert_eq!(store.reads_of("workers"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_resolved_again() {
    let store = MockStore::new("file").with_value("workers", "8").shared();
    let resolver = ResolverBuilder::new()
        .store(store.clone())
        .cache_timeout(Duration::from_secs(10))
        .build();

    let workers = OptionDescriptor::<u32>::new("workers");
    assert_eq!(resolver.get(&workers).await.unwrap(), 8);

    store.set_value("workers", "16");
    tokio::time::advance(Duration::from_secs(9)).await;
    assert_eq!(resolver.get(&workers).await.unwrap(), 8);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(resolver.get(&workers).await.unwrap(), 16);
    assert_eq!(store.reads_of("workers"), 2);
}

#[tokio::test]
async fn test_zero_timeout_bypasses_cache() {
    let store = MockStore::new("file").with_value("flag", "true").shared();
    let resolver = ResolverBuilder::new()
        .store(store.clone())
        .cache_timeout(Duration::ZERO)
        .build();

    let flag = OptionDescriptor::<bool>::new("flag");
    for _ in 0..3 {
        assert!(resolver.get(&flag).await.unwrap());
    }
    assert_eq!(store.reads(), 3);

    store.set_value("flag", "0");
    assert!(!resolver.get(&flag).await.unwrap());
}

#[tokio::test]
async fn test_unbounded_timeout_caches_without_overflow() {
    let store = MockStore::new("file").with_value("a", "1").shared();
    let resolver = ResolverBuilder::new()
        .store(store.clone())
        .cache_timeout(Duration::MAX)
        .build();

    let a = OptionDescriptor::<u8>::new("a");
    assert_eq!(resolver.get(&a).await.unwrap(), 1);
    assert_eq!(resolver.get(&a).await.unwrap(), 1);
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn test_write_then_read_skips_stores() {
    let store = MockStore::new("memory").writable().shared();
    let resolver = ResolverBuilder::new().store(store.clone()).build();

    let level = OptionDescriptor::<String>::new("log.level");
    let result = resolver.set(&level, "trace".to_string()).await.unwrap();
    assert!(result.applied);
    assert_eq!(result.store_index, Some(0));

    let resolved = resolver.resolve(&level).await.unwrap();
    assert_eq!(resolved.value, "trace");
    assert_eq!(resolved.source_index, Some(0));
    assert_eq!(store.reads(), 0);
    assert_eq!(store.written(), vec![("log.level".to_string(), "trace".to_string())]);
}

#[tokio::test]
async fn test_write_falls_through_read_only_store() {
    let env = MockStore::new("env").shared();
    let memory = MockStore::new("memory").writable().shared();
    let resolver = ResolverBuilder::new()
        .store(env.clone())
        .store(memory.clone())
        .build();

    let port = OptionDescriptor::<u16>::new("server.port");
    let result = resolver.set(&port, 9090).await.unwrap();

    assert!(result.applied);
    assert_eq!(result.store_index, Some(1));
    assert_eq!(env.writes(), 0);
    assert_eq!(memory.written(), vec![("server.port".to_string(), "9090".to_string())]);
}

#[tokio::test]
async fn test_write_skips_unsupported_and_failing_stores() {
    let diagnostics = RecordingDiagnostics::new();
    let unsupported = MockStore::new("remote")
        .with_write_mode(WriteMode::Unsupported)
        .shared();
    let failing = MockStore::new("vault").with_write_mode(WriteMode::Fail).shared();
    let memory = MockStore::new("memory").writable().shared();

    let resolver = ResolverBuilder::new()
        .store(unsupported.clone())
        .store(failing.clone())
        .store(memory.clone())
        .diagnostics(diagnostics.clone())
        .build();

    let hosts = OptionDescriptor::<Vec<String>>::new("hosts");
    let result = resolver
        .set(&hosts, vec!["a".to_string(), "b".to_string()])
        .await
        .unwrap();

    assert!(result.applied);
    assert_eq!(result.store_index, Some(2));
    assert_eq!(unsupported.writes(), 1);
    assert_eq!(failing.writes(), 1);
    assert_eq!(memory.written(), vec![("hosts".to_string(), "a,b".to_string())]);

    let outcomes: Vec<StoreOutcome> = diagnostics
        .events()
        .into_iter()
        .map(|event| event.outcome)
        .collect();
    assert_eq!(outcomes[0], StoreOutcome::Unsupported);
    assert!(outcomes[1].is_failure());
    assert_eq!(outcomes[2], StoreOutcome::Written);
}

#[tokio::test]
async fn test_rejected_write_leaves_cache_untouched() {
    let file = MockStore::new("file").with_value("mode", "remote").shared();
    let refusing = MockStore::new("remote")
        .with_write_mode(WriteMode::Fail)
        .shared();
    let resolver = ResolverBuilder::new()
        .store(file.clone())
        .store(refusing.clone())
        .build();

    let mode = OptionDescriptor::<Mode>::new("mode");
    assert_eq!(resolver.get(&mode).await.unwrap(), Mode::Remote);

    let result = resolver.set(&mode, Mode::Local).await.unwrap();
    assert!(!result.applied);
    assert_eq!(result.store_index, None);

    assert_eq!(resolver.get(&mode).await.unwrap(), Mode::Remote);
    assert_eq!(file.reads(), 1);
}

#[tokio::test]
async fn test_no_writable_store_is_not_an_error() {
    let resolver = ResolverBuilder::new()
        .store(MockStore::new("env"))
        .build();

    let level = OptionDescriptor::<String>::new("log.level");
    let result = resolver.set(&level, "info".to_string()).await.unwrap();
    assert!(!result.applied);

    let empty = ResolverBuilder::new().build();
    assert!(!empty.set(&level, "info".to_string()).await.unwrap().applied);
}

#[tokio::test]
async fn test_unconvertible_value_is_an_error() {
    let resolver = ResolverBuilder::new()
        .store(MockStore::new("file").with_value("db.port", "not-a-number"))
        .build();

    let port = OptionDescriptor::<i64>::new("db.port").with_default(5432);
    let err = resolver.get(&port).await.unwrap_err();

    assert_eq!(err.option_name, "db.port");
    assert_eq!(err.raw_value, "not-a-number");
    assert_eq!(err.target_type, "integer");
}

#[tokio::test]
async fn test_list_item_with_delimiter_is_not_written() {
    let store = MockStore::new("memory").writable().shared();
    let resolver = ResolverBuilder::new().store(store.clone()).build();

    let hosts = OptionDescriptor::<Vec<String>>::new("db.hosts");
    let err = resolver
        .set(&hosts, vec!["a,b".to_string()])
        .await
        .unwrap_err();

    assert_eq!(err.option_name, "db.hosts");
    assert_eq!(err.target_type, "list<string>");
    assert_eq!(store.writes(), 0);
    assert!(resolver.get(&hosts).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conversion_error_is_not_cached() {
    let store = MockStore::new("file").with_value("ratio", "half").shared();
    let resolver = ResolverBuilder::new().store(store.clone()).build();

    let ratio = OptionDescriptor::<f64>::new("ratio");
    assert!(resolver.get(&ratio).await.is_err());

    store.set_value("ratio", "0.5");
    assert_eq!(resolver.get(&ratio).await.unwrap(), 0.5);
}

#[tokio::test]
async fn test_default_and_zero_fallbacks() {
    let resolver = ResolverBuilder::new()
        .store(MockStore::new("env"))
        .build();

    let with_default = OptionDescriptor::<String>::new("region").with_default("eu-west-1".to_string());
    assert_eq!(resolver.get(&with_default).await.unwrap(), "eu-west-1");

    assert_eq!(
        resolver.get(&OptionDescriptor::<String>::new("name")).await.unwrap(),
        ""
    );
    assert_eq!(resolver.get(&OptionDescriptor::<i32>::new("count")).await.unwrap(), 0);
    assert!(!resolver.get(&OptionDescriptor::<bool>::new("enabled")).await.unwrap());
    assert!(
        resolver
            .get(&OptionDescriptor::<Vec<u16>>::new("ports"))
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(resolver.get(&OptionDescriptor::<Mode>::new("mode")).await.unwrap(), Mode::Local);

    let empty = ResolverBuilder::new().build();
    let resolved = empty.resolve(&with_default).await.unwrap();
    assert_eq!(resolved.value, "eu-west-1");
    assert!(!resolved.found);
}

#[tokio::test]
async fn test_custom_converter_on_read_and_write() {
    let store = MockStore::new("memory")
        .with_value("timeout", "1500ms")
        .writable()
        .shared();
    let resolver = ResolverBuilder::new()
        .store(store.clone())
        .cache_timeout(Duration::ZERO)
        .build();

    let timeout = OptionDescriptor::<u64>::new("timeout").with_converter(FnConverter::new(
        "millis",
        |raw: &str| {
            raw.trim_end_matches("ms")
                .parse::<u64>()
                .map_err(|e| e.to_string())
        },
        |value: &u64| Ok(format!("{value}ms")),
    ));

    assert_eq!(resolver.get(&timeout).await.unwrap(), 1500);

    let result = resolver.set(&timeout, 250).await.unwrap();
    assert!(result.applied);
    assert_eq!(store.written(), vec![("timeout".to_string(), "250ms".to_string())]);
    assert_eq!(resolver.get(&timeout).await.unwrap(), 250);
}

#[tokio::test]
async fn test_invalidate_forces_reresolution() {
    let store = MockStore::new("file").with_value("a", "1").with_value("b", "2").shared();
    let resolver = ResolverBuilder::new().store(store.clone()).build();

    let a = OptionDescriptor::<u8>::new("a");
    let b = OptionDescriptor::<u8>::new("b");
    assert_eq!(resolver.get(&a).await.unwrap(), 1);
    assert_eq!(resolver.get(&b).await.unwrap(), 2);

    store.set_value("a", "10");
    store.set_value("b", "20");

    resolver.invalidate("a").await;
    assert_eq!(resolver.get(&a).await.unwrap(), 10);
    assert_eq!(resolver.get(&b).await.unwrap(), 2);

    resolver.invalidate_all().await;
    assert_eq!(resolver.get(&b).await.unwrap(), 20);
    assert_eq!(store.reads(), 4);
}

#[tokio::test]
async fn test_same_name_with_other_type_is_resolved_again() {
    let store = MockStore::new("file").with_value("port", "8080").shared();
    let resolver = ResolverBuilder::new().store(store.clone()).build();

    let as_text = OptionDescriptor::<String>::new("port");
    let as_number = OptionDescriptor::<u16>::new("port");

    assert_eq!(resolver.get(&as_text).await.unwrap(), "8080");
    assert_eq!(resolver.get(&as_number).await.unwrap(), 8080);
    assert_eq!(store.reads(), 2);
}
