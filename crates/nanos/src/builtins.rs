use std::time::{Duration, SystemTime};

use nanos_core::catalog::{DescriptorDao, ProxyDao};
use nanos_core::identity::Subject;
use nanos_core::kernel::constants::{DEFAULT_MAIN_ROUTINE, SERVICE_CATALOG_KEY};
use nanos_core::kernel::{Context, Result, RoutineCatalog, ServiceRegistry};

/// Producer id of [`BootClock`].
pub const CLOCK_SERVICE: &str = "clock";

/// Records when it was constructed.
#[derive(Debug, Clone, Copy)]
pub struct BootClock {
    started_at: SystemTime,
}

impl BootClock {
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed().unwrap_or_default()
    }
}

/// Producers a service descriptor can name.
pub fn producers() -> ServiceRegistry {
    let mut producers = ServiceRegistry::new();
    producers.register_type(CLOCK_SERVICE, |_: &Context| {
        Ok(BootClock { started_at: SystemTime::now() })
    });
    producers
}

pub fn routines() -> RoutineCatalog {
    RoutineCatalog::new().with(DEFAULT_MAIN_ROUTINE, report_ready)
}

fn report_ready(context: &Context) -> Result<()> {
    let catalog = context.get_as::<ProxyDao>(SERVICE_CATALOG_KEY)?;
    let services = catalog.select(&Subject::system())?;
    for descriptor in &services {
        let mode = if descriptor.lazy { "lazy" } else { "eager" };
        log::info!("Service {} ({})", descriptor.name, mode);
    }

    if let Ok(clock) = context.get_as::<BootClock>(CLOCK_SERVICE) {
        log::info!("Clock started {:?} ago", clock.uptime());
    }

    println!(
        "Nanos ready: {} services, {} bindings",
        services.len(),
        context.keys().len()
    );
    Ok(())
}
