use std::sync::Arc;
use tempfile::tempdir;

use crate::catalog::{
    decorate, layers, AuthPolicy, AuthenticatedDao, CatalogError, ChainConfig, Decorator, DescriptorDao,
    JournalDao, PerformanceDao, PerformanceRecorder, ProxyDao, ServiceDescriptor, EXPORT_CHAIN,
};
use crate::identity::{Group, Subject, User};
use crate::kernel::error::{Error, Result};
use crate::storage::LocalStorageProvider;

fn seeded_journal(root: &std::path::Path) -> Result<Arc<JournalDao>> {
    let dao = JournalDao::open(Arc::new(LocalStorageProvider::new(root.to_path_buf())), "services")?;
    let system = Subject::system();
    dao.put(&system, ServiceDescriptor::eager("logger"))?;
    dao.put(&system, ServiceDescriptor::new("mailer"))?;
    dao.put(&system, ServiceDescriptor::eager("scheduler"))?;
    Ok(Arc::new(dao))
}

fn subject_with(permission: &str) -> Subject {
    let user = User { id: 42, first_name: "admin".into(), group: "admins".into() };
    Subject::new(user, vec![Group::new("admins").with_permission(permission)])
}

fn is_denied(err: &Error) -> bool {
    matches!(err, Error::Catalog(CatalogError::AuthorizationDenied { .. }))
}

#[test]
fn test_export_chain_order_is_fixed() {
    assert_eq!(EXPORT_CHAIN, [Decorator::Performance, Decorator::Authentication]);
}

#[test]
fn test_decorate_builds_layers_outermost_first() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw: Arc<dyn DescriptorDao> = seeded_journal(temp_dir.path())?;

    let exported = decorate(raw, &EXPORT_CHAIN, &ChainConfig::default());
    assert_eq!(layers(&exported), vec!["performance", "authenticated", "journal"]);
    Ok(())
}

#[test]
fn test_chain_is_transparent_for_authorized_callers() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let exported = decorate(raw.clone(), &EXPORT_CHAIN, &ChainConfig::default());

    let through_chain = exported.select(&subject_with("service"))?;
    assert_eq!(through_chain, raw.load(), "Same descriptors in the same order");
    Ok(())
}

#[test]
fn test_chain_denies_callers_without_capability() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let config = ChainConfig::default();
    let exported = decorate(raw, &EXPORT_CHAIN, &config);

    let err = exported.select(&subject_with("menu.read")).unwrap_err();
    assert!(is_denied(&err), "got {:?}", err);

    let err = exported.select(&Subject::anonymous()).unwrap_err();
    assert!(is_denied(&err), "Anonymous read is off by default, got {:?}", err);

    // Denials are still timed: the measurement wraps the access check.
    assert_eq!(config.recorder.stats("select").map(|s| s.count), Some(2));
    Ok(())
}

#[test]
fn test_read_permission_does_not_grant_write() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let guarded = AuthenticatedDao::new(raw.clone(), AuthPolicy::default());
    let reader = subject_with("service.read");

    assert_eq!(guarded.find(&reader, "mailer")?.map(|d| d.name), Some("mailer".to_string()));
    let err = guarded.put(&reader, ServiceDescriptor::new("intruder")).unwrap_err();
    assert!(is_denied(&err), "got {:?}", err);
    let err = guarded.remove(&reader, "mailer").unwrap_err();
    assert!(is_denied(&err), "got {:?}", err);
    assert_eq!(raw.load().len(), 3, "Denied writes must not reach the store");

    let writer = subject_with("service.*");
    guarded.put(&writer, ServiceDescriptor::new("audit"))?;
    assert_eq!(raw.load().last().map(|d| d.name.as_str()), Some("audit"));
    Ok(())
}

#[test]
fn test_anonymous_read_toggle() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let guarded = AuthenticatedDao::new(raw, AuthPolicy::new("service", true));
    let anonymous = Subject::anonymous();

    assert_eq!(guarded.select(&anonymous)?.len(), 3);
    let err = guarded.put(&anonymous, ServiceDescriptor::new("x")).unwrap_err();
    assert!(is_denied(&err), "Anonymous writes stay forbidden, got {:?}", err);
    Ok(())
}

#[test]
fn test_performance_dao_counts_without_changing_results() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let recorder = Arc::new(PerformanceRecorder::new());
    let measured = PerformanceDao::new(raw.clone(), recorder.clone());
    let subject = Subject::system();

    assert_eq!(measured.select(&subject)?, raw.load());
    measured.select(&subject)?;
    assert!(measured.find(&subject, "nope")?.is_none());

    let select = recorder.stats("select").expect("select should be recorded");
    assert_eq!(select.count, 2);
    assert!(select.max <= select.total);
    assert_eq!(recorder.stats("find").map(|s| s.count), Some(1));
    assert!(recorder.stats("put").is_none());
    assert_eq!(recorder.snapshot().len(), 2);
    Ok(())
}

#[test]
fn test_proxy_unavailable_until_connected() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let raw = seeded_journal(temp_dir.path())?;
    let proxy = ProxyDao::new();

    let err = proxy.select(&Subject::system()).unwrap_err();
    assert!(matches!(err, Error::Catalog(CatalogError::Unavailable)), "got {:?}", err);
    assert!(!proxy.is_connected());

    proxy.set_delegate(raw.clone());
    assert!(proxy.is_connected());
    assert_eq!(proxy.select(&Subject::system())?, raw.load());
    Ok(())
}
