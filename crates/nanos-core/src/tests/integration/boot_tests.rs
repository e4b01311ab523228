use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::common::{counting_registry, setup_data_dir, write_descriptors, CallCounter};
use crate::catalog::ServiceDescriptor;
use crate::kernel::{
    Boot, BootConfig, Context, CredentialEntry, EntryKind, KeyStore, Result, RoutineCatalog, ServiceRegistry,
};

#[test]
fn test_concurrent_lookups_after_boot_construct_once() -> Result<()> {
    let data_dir = setup_data_dir();
    write_descriptors(data_dir.path(), &[ServiceDescriptor::new("cache")])?;
    let counter = Arc::new(CallCounter::default());
    let calls = counter.clone();
    let mut producers = ServiceRegistry::new();
    producers.register_type("cache", move |_: &Context| {
        calls.record("cache");
        thread::sleep(Duration::from_millis(25));
        Ok(vec![0u8; 16])
    });

    let context = Boot::new(BootConfig::new(data_dir.path()), producers).run()?;
    let instances = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| context.get_as::<Vec<u8>>("cache")))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("Lookup thread panicked"))
            .collect::<Result<Vec<_>>>()
    })?;

    assert_eq!(counter.total(), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    Ok(())
}

#[test]
fn test_eager_service_can_depend_on_earlier_ones() -> Result<()> {
    let data_dir = setup_data_dir();
    write_descriptors(
        data_dir.path(),
        &[ServiceDescriptor::eager("config"), ServiceDescriptor::eager("server"), ServiceDescriptor::new("db")],
    )?;
    let counter = Arc::new(CallCounter::default());
    let mut producers = counting_registry(&["config", "db"], &counter);
    let calls = counter.clone();
    producers.register_type("server", move |ctx: &Context| {
        let config = ctx.get_as::<String>("config")?;
        let db = ctx.get_as::<String>("db")?;
        calls.record("server");
        Ok(format!("server({}, {})", config, db))
    });

    let context = Boot::new(BootConfig::new(data_dir.path()), producers).run()?;
    assert_eq!(counter.calls(), vec!["config", "db", "server"]);
    assert_eq!(*context.get_as::<String>("server")?, "server(config, db)");
    Ok(())
}

#[test]
fn test_duplicate_descriptor_name_last_wins() -> Result<()> {
    let data_dir = setup_data_dir();
    let journal = [
        r#"{"op":"put","descriptor":{"name":"store","service":"memory"}}"#,
        r#"{"op":"put","descriptor":{"name":"other"}}"#,
        r#"{"op":"put","descriptor":{"name":"store","service":"disk","lazy":false}}"#,
    ]
    .join("\n");
    fs::write(data_dir.path().join("services"), journal).expect("Failed to write journal");
    let counter = Arc::new(CallCounter::default());
    let producers = counting_registry(&["memory", "disk", "other"], &counter);

    let context = Boot::new(BootConfig::new(data_dir.path()), producers).run()?;
    assert_eq!(counter.calls(), vec!["disk"], "Latest descriptor decides the producer and mode");
    assert_eq!(*context.get_as::<String>("store")?, "disk");
    Ok(())
}

#[test]
fn test_startup_routine_reads_credentials() -> Result<()> {
    let data_dir = setup_data_dir();
    let mut store = KeyStore::new();
    store.insert("api", CredentialEntry::new(EntryKind::Secret, "token"));
    fs::write(data_dir.path().join("config.properties"), "keystore.password = hunter2\n")
        .expect("Failed to write properties");
    fs::write(data_dir.path().join("keystore.jks"), store.to_bytes("hunter2")?).expect("Failed to write key store");

    let counter = Arc::new(CallCounter::default());
    let seen = counter.clone();
    let routines = RoutineCatalog::new().with("main", move |ctx: &Context| {
        let key_store = ctx.instance::<KeyStore>()?;
        for alias in key_store.aliases() {
            seen.record(alias);
        }
        Ok(())
    });

    Boot::new(BootConfig::new(data_dir.path()), ServiceRegistry::new())
        .with_routines(routines)
        .run()?;
    assert_eq!(counter.calls(), vec!["api"]);
    Ok(())
}
