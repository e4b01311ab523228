use std::sync::Arc;

use crate::catalog::{decorate, ChainConfig, JournalDao, PerformanceRecorder, ProxyDao, ServiceDescriptor, EXPORT_CHAIN};
use crate::identity::{Session, User};
use crate::kernel::config::BootConfig;
use crate::kernel::constants;
use crate::kernel::context::{BindingKey, Context};
use crate::kernel::credentials::{key_store_factory, KeyStore};
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::kernel::factory::SingletonFactory;
use crate::kernel::registry::ServiceRegistry;
use crate::kernel::routine::RoutineCatalog;
use crate::storage::Storage;

/// Boot sequencer: assembles the root store and starts the services.
///
/// Phases run strictly in order; a failure in any of them before the startup
/// routine aborts the boot. A sequencer runs once.
pub struct Boot {
    config: BootConfig,
    producers: ServiceRegistry,
    routines: Option<RoutineCatalog>,
    recorder: Arc<PerformanceRecorder>,
    phase: KernelLifecyclePhase,
    context: Option<Context>,
}

/// What the foundation phase hands to the later phases.
struct Foundations {
    scope: Context,
    catalog: Arc<ProxyDao>,
}

impl Boot {
    pub fn new(config: BootConfig, producers: ServiceRegistry) -> Self {
        Self {
            config,
            producers,
            routines: None,
            recorder: Arc::new(PerformanceRecorder::new()),
            phase: KernelLifecyclePhase::Init,
            context: None,
        }
    }

    /// Bind `routines` as the routine catalog during the foundation phase.
    pub fn with_routines(mut self, routines: RoutineCatalog) -> Self {
        self.routines = Some(routines);
        self
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Last phase completed.
    pub fn phase(&self) -> KernelLifecyclePhase {
        self.phase
    }

    /// The root store, once it has been frozen.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Timings of the exported service catalog.
    pub fn recorder(&self) -> &Arc<PerformanceRecorder> {
        &self.recorder
    }

    /// Run every phase and return the frozen root store.
    pub fn run(&mut self) -> Result<Context> {
        if self.phase != KernelLifecyclePhase::Init {
            return Err(Error::KernelLifecycleError {
                phase: self.phase,
                message: "Boot sequence already ran".to_string(),
            });
        }
        log::info!("Booting {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let root = Context::new();
        let foundations = self.install_foundations(&root)?;
        self.phase = KernelLifecyclePhase::FoundationsLoaded;

        let (journal, descriptors) = self.register_services(&foundations.scope)?;
        self.phase = KernelLifecyclePhase::CatalogRegistered;

        foundations.scope.freeze()?;
        self.export_catalog(&foundations.catalog, journal);
        self.context = Some(root.clone());
        self.phase = KernelLifecyclePhase::Frozen;

        self.start_services(&root, &descriptors)?;
        self.phase = KernelLifecyclePhase::ServicesStarted;

        self.run_startup_routine(&root)?;
        self.phase = KernelLifecyclePhase::ScriptRun;
        log::info!("Boot complete");
        Ok(root)
    }

    fn install_foundations(&self, root: &Context) -> Result<Foundations> {
        let scope = root.derive()?;

        let storage = Storage::new(self.config.data_dir.clone());
        storage.ensure_data_dir()?;
        log::info!("Data directory: {}", storage.data_dir().display());
        scope.put_instance(storage)?;

        let user = User::system();
        let session = Session::for_user(&user);
        scope.put(constants::USER_KEY, Arc::new(user))?;
        scope.put_instance(session)?;

        scope.put_type_factory::<KeyStore>(key_store_factory(
            self.config.properties_file.clone(),
            self.config.key_store_file.clone(),
        ))?;

        let catalog = Arc::new(ProxyDao::new());
        scope.put(constants::SERVICE_CATALOG_KEY, catalog.clone())?;
        scope.put(BindingKey::of::<PerformanceRecorder>(), self.recorder.clone())?;

        if let Some(routines) = &self.routines {
            scope.put(constants::ROUTINE_CATALOG_KEY, Arc::new(routines.clone()))?;
        }

        Ok(Foundations { scope, catalog })
    }

    // Reads the raw journal; the exported chain is not installed yet.
    fn register_services(&self, scope: &Context) -> Result<(Arc<JournalDao>, Vec<ServiceDescriptor>)> {
        let storage = scope.instance::<Storage>()?;
        let journal = Arc::new(JournalDao::open(storage.provider().clone(), &self.config.services_journal)?);

        let mut registered = Vec::new();
        for descriptor in journal.load() {
            let Some(producer) = self.producers.get(descriptor.producer_id()) else {
                log::warn!(
                    "No producer '{}' for service '{}'; skipping",
                    descriptor.producer_id(),
                    descriptor.name
                );
                continue;
            };
            log::info!("Registering: {}", descriptor.name);
            let factory = SingletonFactory::new(move |context: &Context| producer.create(context));
            scope.put_factory(descriptor.name.as_str(), factory)?;
            registered.push(descriptor);
        }

        Ok((journal, registered))
    }

    fn export_catalog(&self, proxy: &ProxyDao, journal: Arc<JournalDao>) {
        let config = ChainConfig {
            policy: self.config.catalog_policy.clone(),
            recorder: self.recorder.clone(),
        };
        proxy.set_delegate(decorate(journal, &EXPORT_CHAIN, &config));
    }

    fn start_services(&self, context: &Context, descriptors: &[ServiceDescriptor]) -> Result<()> {
        for descriptor in descriptors.iter().filter(|d| !d.lazy) {
            log::info!("Starting: {}", descriptor.name);
            context
                .get(descriptor.name.as_str())
                .map_err(|source| Error::EagerStart {
                    service: descriptor.name.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn run_startup_routine(&self, context: &Context) -> Result<()> {
        let name = &self.config.main_routine;
        if !context.contains(constants::ROUTINE_CATALOG_KEY) {
            log::debug!("No routine catalog bound; skipping startup routine '{}'", name);
            return Ok(());
        }
        let routines = context.get_as::<RoutineCatalog>(constants::ROUTINE_CATALOG_KEY)?;
        let Some(routine) = routines.find(name) else {
            log::debug!("No startup routine named '{}'", name);
            return Ok(());
        };

        log::info!("Running startup routine '{}'", name);
        routine(context).map_err(|source| Error::RoutineFailed {
            routine: name.clone(),
            source: Box::new(source),
        })
    }
}
