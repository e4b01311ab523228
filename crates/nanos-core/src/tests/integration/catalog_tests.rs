use std::sync::Arc;

use super::common::{counting_registry, setup_data_dir, write_descriptors, CallCounter};
use crate::catalog::{AuthPolicy, CatalogError, DescriptorDao, ProxyDao, ServiceDescriptor};
use crate::identity::Subject;
use crate::kernel::constants::SERVICE_CATALOG_KEY;
use crate::kernel::{Boot, BootConfig, Error, Result};

#[test]
fn test_catalog_changes_apply_on_next_boot() -> Result<()> {
    let data_dir = setup_data_dir();
    write_descriptors(data_dir.path(), &[ServiceDescriptor::eager("a"), ServiceDescriptor::eager("b")])?;
    let counter = Arc::new(CallCounter::default());

    let first = Boot::new(BootConfig::new(data_dir.path()), counting_registry(&["a", "b", "c"], &counter)).run()?;
    let catalog = first.get_as::<ProxyDao>(SERVICE_CATALOG_KEY)?;
    catalog.remove(&Subject::system(), "a")?;
    catalog.put(&Subject::system(), ServiceDescriptor::eager("c"))?;
    assert_eq!(counter.calls(), vec!["a", "b"]);

    Boot::new(BootConfig::new(data_dir.path()), counting_registry(&["a", "b", "c"], &counter)).run()?;
    assert_eq!(counter.calls(), vec!["a", "b", "b", "c"]);
    Ok(())
}

#[test]
fn test_anonymous_read_policy() -> Result<()> {
    let data_dir = setup_data_dir();
    write_descriptors(data_dir.path(), &[ServiceDescriptor::new("a")])?;
    let config = BootConfig::new(data_dir.path()).with_catalog_policy(AuthPolicy::new("service", true));
    let counter = Arc::new(CallCounter::default());

    let context = Boot::new(config, counting_registry(&["a"], &counter)).run()?;
    let catalog = context.get_as::<ProxyDao>(SERVICE_CATALOG_KEY)?;

    let anonymous = Subject::anonymous();
    assert_eq!(catalog.find(&anonymous, "a")?, Some(ServiceDescriptor::new("a")));
    assert!(matches!(
        catalog.put(&anonymous, ServiceDescriptor::new("b")),
        Err(Error::Catalog(CatalogError::AuthorizationDenied { .. }))
    ));
    assert_eq!(catalog.select(&Subject::system())?.len(), 1, "Denied write left the catalog unchanged");
    Ok(())
}
