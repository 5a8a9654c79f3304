//! Ленивый IoC контейнер с singleton кэшем
//!
//! По упорядоченной таблице дескрипторов контейнер лениво загружает модуль
//! реализации каждого сервиса, рекурсивно разрешает и конструирует
//! объявленные зависимости, кэширует результат как singleton по имени
//! экземпляра и опционально выполняет асинхронные post-build действия.
//!
//! ГАРАНТИИ:
//! - Модуль импортируется не более одного раза на имя, даже под
//!   конкурентными запросами (in-flight мемоизация)
//! - Конструктор экземпляра выполняется ровно один раз на имя;
//!   конкурентные вызовы получают один и тот же Arc
//! - Зависимости полностью собраны (включая post-build) до того, как
//!   зависящий от них конструктор получит их в аргументы
//! - Экземпляр попадает в singleton кэш только после полного завершения
//!   сборки
//!
//! # Пример
//!
//! ```
//! use injector::{
//!     service_path, Injected, Service, ServiceContainer, ServiceDescriptor, ServiceModule,
//! };
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! #[async_trait::async_trait]
//! impl Service for Logger {
//!     fn as_any(&self) -> &(dyn Any + Send + Sync) { self }
//!     fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
//! }
//!
//! # tokio_test::block_on(async {
//! let container = ServiceContainer::builder()
//!     .with_descriptor(ServiceDescriptor::new(
//!         "Logger",
//!         service_path(|| async {
//!             Ok(ServiceModule::from_fn(|_args: Vec<Injected>| {
//!                 Ok(Arc::new(Logger) as Arc<dyn Service>)
//!             }))
//!         }),
//!     ))
//!     .build();
//!
//! let logger = container.load_service("Logger").await.expect("must load");
//! assert!(logger.as_any().downcast_ref::<Logger>().is_some());
//! # });
//! ```

mod builder;
mod container;
mod descriptor;
mod errors;
mod resolver;
mod service;
mod stats;
mod validate;

pub use container::{ContainerBuilder, ServiceContainer};
pub use descriptor::{InjectionSpec, ServiceDescriptor};
pub use errors::{InjectorError, Result};
pub use service::{
    service_path, Injected, ModuleAccessor, Service, ServiceConstructor, ServiceModule,
};
pub use stats::ContainerStats;
