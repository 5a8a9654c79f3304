//! Service Registry - внешний фасад контейнера
//!
//! АРХИТЕКТУРНЫЕ РЕШЕНИЯ:
//! - Контейнер создается явно и живет столько, сколько нужно вызывающему
//!   коду: никакого process-global состояния
//! - Clone поверх Arc внутреннего состояния: контейнер дешево передается
//!   между задачами, все клоны видят одни и те же кэши
//! - Разделяемые in-flight операции (futures::Shared): конкурентные
//!   запросы одного имени присоединяются к уже идущей загрузке вместо
//!   запуска дубликата
//! - Все мутации кэшей происходят в синхронных секциях между await:
//!   ни один lock не удерживается через точку приостановки

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::descriptor::{find_descriptor, ServiceDescriptor};
use crate::errors::{InjectorError, Result};
use crate::service::{Service, ServiceConstructor};
use crate::stats::{ContainerStats, StatsCounters};

/// Разделяемая in-flight операция загрузки
pub(crate) type SharedLoad<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Внутреннее состояние, разделяемое всеми клонами контейнера
pub(crate) struct ContainerState {
    /// Таблица дескрипторов; читается при каждом поиске, очищается reset'ом
    pub(crate) descriptors: RwLock<Vec<ServiceDescriptor>>,
    /// SERVICES: имя -> имя, производная таблица для вызывающего кода
    pub(crate) service_names: RwLock<HashMap<String, String>>,
    /// Кэш загруженных модулей: имя экземпляра -> конструктор
    pub(crate) modules: RwLock<HashMap<String, ServiceConstructor>>,
    /// In-flight загрузки модулей
    pub(crate) module_loads: Mutex<HashMap<String, SharedLoad<ServiceConstructor>>>,
    /// Singleton кэш собранных экземпляров
    pub(crate) instances: RwLock<HashMap<String, Arc<dyn Service>>>,
    /// In-flight загрузки экземпляров (полный цикл: модули + сборка)
    pub(crate) in_flight: Mutex<HashMap<String, SharedLoad<Arc<dyn Service>>>>,
    pub(crate) counters: StatsCounters,
}

/// IoC контейнер с ленивой загрузкой модулей и singleton кэшем
#[derive(Clone)]
pub struct ServiceContainer {
    pub(crate) state: Arc<ContainerState>,
}

impl ServiceContainer {
    /// Создать контейнер из упорядоченной таблицы дескрипторов.
    ///
    /// Таблица SERVICES строится сразу и целиком; ни модули, ни экземпляры
    /// при этом не загружаются.
    pub fn new(descriptors: Vec<ServiceDescriptor>) -> Self {
        let service_names = Self::build_service_names(&descriptors);
        info!(
            services = descriptors.len(),
            "🚀 Создание ServiceContainer"
        );

        Self {
            state: Arc::new(ContainerState {
                descriptors: RwLock::new(descriptors),
                service_names: RwLock::new(service_names),
                modules: RwLock::new(HashMap::new()),
                module_loads: Mutex::new(HashMap::new()),
                instances: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                counters: StatsCounters::default(),
            }),
        }
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn build_service_names(descriptors: &[ServiceDescriptor]) -> HashMap<String, String> {
        descriptors
            .iter()
            .map(|descriptor| {
                let name = descriptor.instance_name().to_string();
                (name.clone(), name)
            })
            .collect()
    }

    /// Таблица SERVICES: каждое известное имя экземпляра -> само себя.
    ///
    /// Чисто справочная таблица, чтобы вызывающий код не писал строковые
    /// literals руками.
    pub fn services(&self) -> HashMap<String, String> {
        self.state.service_names.read().clone()
    }

    /// Загрузить один сервис по имени экземпляра.
    ///
    /// Попадание в singleton кэш возвращается сразу, без повторного
    /// разрешения. Иначе вызов присоединяется к уже идущей загрузке этого
    /// имени либо запускает новую: поиск дескриптора, загрузка модулей,
    /// сборка экземпляра, кэширование.
    pub async fn load_service(&self, name: &str) -> Result<Arc<dyn Service>> {
        self.load_inner(name.to_string()).await
    }

    /// Загрузить несколько сервисов конкурентно.
    ///
    /// Результаты возвращаются в порядке входных имен, не в порядке
    /// завершения. Пустой вход дает пустой результат.
    pub async fn load_services<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn Service>>> {
        futures::future::try_join_all(names.iter().map(|name| self.load_service(name.as_ref())))
            .await
    }

    /// Рекурсивная точка входа загрузки; используется и фасадом, и
    /// сборщиком при разрешении service-reference инъекций.
    pub(crate) fn load_inner(&self, name: String) -> BoxFuture<'static, Result<Arc<dyn Service>>> {
        let container = self.clone();
        async move {
            if let Some(instance) = container.state.instances.read().get(&name) {
                container.state.counters.record_hit();
                return Ok(instance.clone());
            }
            container.state.counters.record_miss();

            let load = {
                let mut in_flight = container.state.in_flight.lock();
                // Перепроверка под lock'ом: экземпляр мог закэшироваться
                // пока брали mutex
                if let Some(instance) = container.state.instances.read().get(&name) {
                    return Ok(instance.clone());
                }
                match in_flight.get(&name) {
                    Some(load) => load.clone(),
                    None => {
                        let load = container
                            .clone()
                            .drive_load(name.clone())
                            .boxed()
                            .shared();
                        in_flight.insert(name.clone(), load.clone());
                        load
                    }
                }
            };

            load.await
        }
        .boxed()
    }

    /// Полный цикл загрузки одного имени; выполняется ровно один раз на
    /// in-flight запись, результат разделяется всеми ожидающими
    async fn drive_load(self, name: String) -> Result<Arc<dyn Service>> {
        let descriptor = self
            .find_descriptor(&name)
            .ok_or_else(|| InjectorError::definition_not_found(&name))?;
        debug!(service = %name, "loading service");

        self.resolve_modules(&descriptor).await?;
        let instance = self.build_instance(&descriptor).await?;

        self.state
            .instances
            .write()
            .insert(name.clone(), instance.clone());
        // Запись снимается только после кэширования экземпляра: окно между
        // завершением сборки и появлением singleton'а закрыто
        self.state.in_flight.lock().remove(&name);

        debug!(service = %name, "service ready");
        Ok(instance)
    }

    pub(crate) fn find_descriptor(&self, name: &str) -> Option<ServiceDescriptor> {
        find_descriptor(&self.state.descriptors.read(), name).cloned()
    }

    /// Снимок статистики
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            known_services: self.state.service_names.read().len(),
            loaded_modules: self.state.modules.read().len(),
            cached_instances: self.state.instances.read().len(),
            cache_hits: self.state.counters.hits(),
            cache_misses: self.state.counters.misses(),
            modules_in_flight: self.state.module_loads.lock().len(),
            instances_in_flight: self.state.in_flight.lock().len(),
        }
    }

    /// Вернуть контейнер в исходное пустое состояние.
    ///
    /// Очищает все кэши, in-flight таблицы, таблицу дескрипторов и
    /// SERVICES. Предназначен для тестовых harness'ов; в рабочем цикле
    /// не вызывается.
    pub fn reset(&self) {
        self.state.descriptors.write().clear();
        self.state.service_names.write().clear();
        self.state.modules.write().clear();
        self.state.module_loads.lock().clear();
        self.state.instances.write().clear();
        self.state.in_flight.lock().clear();
        self.state.counters.reset();
        debug!("container reset");
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Пошаговое создание контейнера
#[derive(Default)]
pub struct ContainerBuilder {
    descriptors: Vec<ServiceDescriptor>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_descriptor(mut self, descriptor: ServiceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with_descriptors(
        mut self,
        descriptors: impl IntoIterator<Item = ServiceDescriptor>,
    ) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    pub fn build(self) -> ServiceContainer {
        ServiceContainer::new(self.descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{service_path, ServiceModule};

    fn empty_descriptor(class: &str) -> ServiceDescriptor {
        ServiceDescriptor::new(class, service_path(|| async { Ok(ServiceModule::empty()) }))
    }

    #[test]
    fn test_service_names_table_uses_effective_names() {
        let container = ServiceContainer::builder()
            .with_descriptor(empty_descriptor("Database"))
            .with_descriptor(empty_descriptor("Conn").with_instance_name("primary"))
            .build();

        let services = container.services();
        assert_eq!(services.len(), 2);
        assert_eq!(services.get("Database"), Some(&"Database".to_string()));
        assert_eq!(services.get("primary"), Some(&"primary".to_string()));
        // Явно именованный дескриптор в таблице под именем экземпляра,
        // не под именем класса
        assert!(!services.contains_key("Conn"));
    }

    #[tokio::test]
    async fn test_unknown_name_fails_with_definition_not_found() {
        let container = ServiceContainer::new(Vec::new());

        let err = container
            .load_service("ghost")
            .await
            .expect_err("unknown name must fail");
        assert_eq!(err, InjectorError::definition_not_found("ghost"));
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_result() {
        let container = ServiceContainer::new(Vec::new());
        let loaded = container
            .load_services::<&str>(&[])
            .await
            .expect("empty batch must succeed");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_reset_returns_container_to_initial_state() {
        let container = ServiceContainer::builder()
            .with_descriptor(empty_descriptor("Database"))
            .build();
        assert_eq!(container.stats().known_services, 1);

        container.reset();

        let stats = container.stats();
        assert_eq!(stats, ContainerStats::default());
        assert!(container.services().is_empty());
    }
}
