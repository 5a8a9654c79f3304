//! Базовые абстракции управляемого сервиса
//!
//! АРХИТЕКТУРНЫЕ РЕШЕНИЯ:
//! - Arc<dyn Service> вместо generic параметров: контейнер работает
//!   со строковыми именами, тип восстанавливается downcast'ом на стороне вызова
//! - Конструктор модуля - обычная Fn(Vec<Injected>) -> Result, без trait hierarchies
//! - Accessor модуля - отложенная async функция: импорт происходит только
//!   когда сервис действительно запрошен

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

/// Управляемый контейнером сервис.
///
/// Каждая реализация даёт доступ к себе как к `Any` (для downcast на
/// стороне вызова) и диспетчеризует именованные post-build действия.
#[async_trait]
pub trait Service: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Выполнить именованное post-build действие.
    ///
    /// `None` означает что действия с таким именем у экземпляра нет -
    /// контейнер превратит это в `InvalidPostBuildAction`. `Some(result)`
    /// означает что действие выполнилось (возможно, с ошибкой).
    async fn post_build_action(&self, _name: &str) -> Option<anyhow::Result<()>> {
        None
    }
}

/// Один позиционный аргумент конструктора
#[derive(Clone)]
pub enum Injected {
    /// Разрешённый singleton другого сервиса
    Service(Arc<dyn Service>),
    /// Literal значение, переданное как есть
    Value(Value),
}

impl Injected {
    pub fn as_service(&self) -> Option<&Arc<dyn Service>> {
        match self {
            Injected::Service(service) => Some(service),
            Injected::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Injected::Service(_) => None,
            Injected::Value(value) => Some(value),
        }
    }

    /// Downcast инъектированного сервиса к конкретному типу
    pub fn downcast_service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Injected::Service(service) => service.clone().into_any().downcast::<T>().ok(),
            Injected::Value(_) => None,
        }
    }
}

impl std::fmt::Debug for dyn Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Service")
    }
}

impl std::fmt::Debug for Injected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Injected::Service(_) => f.write_str("Injected::Service(..)"),
            Injected::Value(value) => write!(f, "Injected::Value({value})"),
        }
    }
}

/// Конструктор сервиса, экспортируемый модулем
pub type ServiceConstructor =
    Arc<dyn Fn(Vec<Injected>) -> anyhow::Result<Arc<dyn Service>> + Send + Sync>;

/// Результат работы accessor'а: модуль с опциональным конструктором.
///
/// Отсутствие конструктора моделирует модуль без пригодного default
/// export'а и превращается контейнером в `PathNotFound`.
#[derive(Clone)]
pub struct ServiceModule {
    pub constructor: Option<ServiceConstructor>,
}

impl std::fmt::Debug for ServiceModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceModule")
            .field("constructor", &self.constructor.as_ref().map(|_| "..."))
            .finish()
    }
}

impl ServiceModule {
    pub fn new(constructor: ServiceConstructor) -> Self {
        Self {
            constructor: Some(constructor),
        }
    }

    /// Модуль без конструктора
    pub fn empty() -> Self {
        Self { constructor: None }
    }

    /// Обернуть замыкание-конструктор в модуль
    pub fn from_fn<F>(constructor: F) -> Self
    where
        F: Fn(Vec<Injected>) -> anyhow::Result<Arc<dyn Service>> + Send + Sync + 'static,
    {
        Self::new(Arc::new(constructor))
    }
}

/// Отложенный асинхронный accessor модуля сервиса
pub type ModuleAccessor =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<ServiceModule>> + Send + Sync>;

/// Обернуть async замыкание в `ModuleAccessor`.
///
/// ```
/// use injector::{service_path, Injected, Service, ServiceModule};
/// use std::any::Any;
/// use std::sync::Arc;
///
/// struct Logger;
///
/// #[async_trait::async_trait]
/// impl Service for Logger {
///     fn as_any(&self) -> &(dyn Any + Send + Sync) { self }
///     fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
/// }
///
/// let path = service_path(|| async {
///     Ok(ServiceModule::from_fn(|_args: Vec<Injected>| {
///         Ok(Arc::new(Logger) as Arc<dyn Service>)
///     }))
/// });
/// ```
pub fn service_path<F, Fut>(accessor: F) -> ModuleAccessor
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ServiceModule>> + Send + 'static,
{
    Arc::new(move || accessor().boxed())
}
