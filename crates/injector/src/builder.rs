//! Сборка экземпляров
//!
//! Превращает дескриптор с уже загруженным модулем в готовый singleton:
//! собирает аргументы конструктора (рекурсивно разрешая service-reference
//! инъекции через фасад), вызывает конструктор, последовательно выполняет
//! post-build действия и освобождает in-flight запись загрузки модуля.

use serde_json::Value;
use tracing::debug;

use crate::container::ServiceContainer;
use crate::descriptor::{InjectionSpec, ServiceDescriptor};
use crate::errors::{InjectorError, Result};
use crate::service::{Injected, Service};
use std::sync::Arc;

/// Falsy-значение в смысле исходной семантики инъекций: null, false,
/// числовой ноль, пустая строка. Массивы и объекты всегда truthy.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl ServiceContainer {
    /// Собрать экземпляр по дескриптору. Модуль дескриптора должен быть
    /// загружен (`resolve_modules`).
    pub(crate) async fn build_instance(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Arc<dyn Service>> {
        let class_name = descriptor.service_class_name.as_str();
        let instance_name = descriptor.instance_name();

        // Аргументы собираются строго в порядке объявления инъекций
        let mut args = Vec::with_capacity(descriptor.service_injections.len());
        for spec in &descriptor.service_injections {
            match spec {
                InjectionSpec::ServiceRef {
                    service_instance_name,
                } => {
                    let dependency = self.load_inner(service_instance_name.clone()).await?;
                    args.push(Injected::Service(dependency));
                }
                InjectionSpec::Custom { custom_injection } => {
                    // Квирк исходной семантики: falsy значение молча
                    // выпадает из списка аргументов, сдвигая последующие
                    // позиции
                    if is_falsy(custom_injection) {
                        debug!(service = %instance_name, value = %custom_injection, "dropping falsy custom injection");
                        continue;
                    }
                    args.push(Injected::Value(custom_injection.clone()));
                }
                InjectionSpec::Invalid(raw) => {
                    return Err(InjectorError::invalid_injection(class_name, raw.to_string()));
                }
            }
        }

        let constructor = self
            .state
            .modules
            .read()
            .get(instance_name)
            .cloned()
            .ok_or_else(|| InjectorError::path_not_found(instance_name))?;

        let instance = constructor(args)
            .map_err(|source| InjectorError::construction(class_name, source.to_string()))?;

        // Post-build действия: строго последовательно, в объявленном
        // порядке; уже выполненные действия при ошибке не откатываются
        for action in &descriptor.post_build_async_actions {
            match instance.post_build_action(action).await {
                None => {
                    return Err(InjectorError::invalid_post_build_action(action, class_name));
                }
                Some(Err(source)) => {
                    return Err(InjectorError::post_build_failed(
                        action,
                        class_name,
                        source.to_string(),
                    ));
                }
                Some(Ok(())) => {
                    debug!(service = %instance_name, action = %action, "post build action completed");
                }
            }
        }

        // Модуль уже в кэше; запись о его загрузке больше не нужна, и
        // последующие вызовы идут прямиком в singleton кэш
        self.state.module_loads.lock().remove(instance_name);

        Ok(instance)
    }
}
