#![allow(dead_code)]

//! Общие фикстуры интеграционных тестов

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use injector::{service_path, Injected, Service, ServiceDescriptor, ServiceModule};
use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("injector=debug")
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Счетчики жизненного цикла одного дескриптора
#[derive(Default)]
pub struct LifecycleCounters {
    /// Вызовы accessor'а модуля
    pub imports: AtomicUsize,
    /// Вызовы конструктора
    pub constructions: AtomicUsize,
}

impl LifecycleCounters {
    pub fn imports(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

/// Тестовый сервис: запоминает аргументы конструктора и выполненные
/// post-build действия
pub struct StubService {
    pub label: String,
    pub args: Vec<Injected>,
    pub actions: Mutex<Vec<String>>,
    pub known_actions: Vec<String>,
    pub failing_action: Option<String>,
}

#[async_trait::async_trait]
impl Service for StubService {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    async fn post_build_action(&self, name: &str) -> Option<anyhow::Result<()>> {
        if self.failing_action.as_deref() == Some(name) {
            return Some(Err(anyhow::anyhow!("action '{name}' exploded")));
        }
        if self.known_actions.iter().any(|action| action == name) {
            self.actions
                .lock()
                .expect("actions mutex poisoned")
                .push(name.to_string());
            return Some(Ok(()));
        }
        None
    }
}

/// Полная форма заготовки дескриптора
pub struct StubOptions {
    pub known_actions: Vec<String>,
    pub failing_action: Option<String>,
    pub import_delay_ms: u64,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            known_actions: Vec::new(),
            failing_action: None,
            import_delay_ms: 0,
        }
    }
}

/// Дескриптор тестового сервиса с внешними счетчиками
pub fn stub_descriptor(
    class: &'static str,
    counters: Arc<LifecycleCounters>,
    options: StubOptions,
) -> ServiceDescriptor {
    let StubOptions {
        known_actions,
        failing_action,
        import_delay_ms,
    } = options;
    let label = class.to_string();

    ServiceDescriptor::new(
        class,
        service_path(move || {
            counters.imports.fetch_add(1, Ordering::SeqCst);
            let counters = Arc::clone(&counters);
            let label = label.clone();
            let known_actions = known_actions.clone();
            let failing_action = failing_action.clone();
            async move {
                if import_delay_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(import_delay_ms)).await;
                }
                Ok(ServiceModule::from_fn(move |args| {
                    counters.constructions.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(StubService {
                        label: label.clone(),
                        args,
                        actions: Mutex::new(Vec::new()),
                        known_actions: known_actions.clone(),
                        failing_action: failing_action.clone(),
                    }) as Arc<dyn Service>)
                }))
            }
        }),
    )
}

/// Дескриптор без действий и задержек, со свежими счетчиками
pub fn counted_stub(class: &'static str) -> (ServiceDescriptor, Arc<LifecycleCounters>) {
    let counters = Arc::new(LifecycleCounters::default());
    let descriptor = stub_descriptor(class, Arc::clone(&counters), StubOptions::default());
    (descriptor, counters)
}

pub fn as_stub(service: &Arc<dyn Service>) -> &StubService {
    service
        .as_any()
        .downcast_ref::<StubService>()
        .expect("instance must be a StubService")
}

/// Выполненные post-build действия сервиса
pub fn recorded_actions(service: &Arc<dyn Service>) -> Vec<String> {
    as_stub(service)
        .actions
        .lock()
        .expect("actions mutex poisoned")
        .clone()
}
