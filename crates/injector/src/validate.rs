//! Статическая валидация таблицы дескрипторов
//!
//! Справочная проверка без какой-либо загрузки: висячие service-reference
//! ссылки, циклы объявлений, статически некорректные инъекции. Ленивый
//! путь загрузки выполняет собственные проверки независимо от этой.

use crate::container::ServiceContainer;
use crate::descriptor::{find_descriptor, InjectionSpec, ServiceDescriptor};
use crate::errors::{InjectorError, Result};

impl ServiceContainer {
    /// Проверить все дескрипторы таблицы. Первая найденная проблема
    /// возвращается как соответствующая ошибка таксономии.
    pub fn validate_dependencies(&self) -> Result<()> {
        let descriptors = self.state.descriptors.read().clone();
        for descriptor in &descriptors {
            let mut chain = vec![descriptor.instance_name().to_string()];
            check_descriptor(&descriptors, descriptor, &mut chain)?;
        }
        Ok(())
    }
}

fn check_descriptor(
    table: &[ServiceDescriptor],
    descriptor: &ServiceDescriptor,
    chain: &mut Vec<String>,
) -> Result<()> {
    for spec in &descriptor.service_injections {
        match spec {
            InjectionSpec::ServiceRef {
                service_instance_name,
            } => {
                let Some(dependency) = find_descriptor(table, service_instance_name) else {
                    return Err(InjectorError::definition_not_found(service_instance_name));
                };
                if chain.iter().any(|ancestor| ancestor == service_instance_name) {
                    chain.push(service_instance_name.clone());
                    return Err(InjectorError::circular_dependency(chain));
                }
                chain.push(service_instance_name.clone());
                check_descriptor(table, dependency, chain)?;
                chain.pop();
            }
            InjectionSpec::Custom { .. } => {}
            InjectionSpec::Invalid(raw) => {
                return Err(InjectorError::invalid_injection(
                    &descriptor.service_class_name,
                    raw.to_string(),
                ));
            }
        }
    }
    Ok(())
}
