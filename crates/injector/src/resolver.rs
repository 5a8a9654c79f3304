//! Загрузчик модулей и разрешение зависимостей
//!
//! Отвечает за то, чтобы к моменту сборки экземпляра его модуль и модули
//! всех (транзитивных) service-reference зависимостей были загружены.
//! Каждый модуль импортируется не более одного раза: завершенные загрузки
//! лежат в кэше модулей, идущие - разделяются через in-flight таблицу.

use futures::FutureExt;
use tracing::debug;

use crate::container::{ServiceContainer, SharedLoad};
use crate::descriptor::ServiceDescriptor;
use crate::errors::{InjectorError, Result};
use crate::service::ServiceConstructor;

impl ServiceContainer {
    /// Имена еще не загруженных транзитивных зависимостей дескриптора.
    ///
    /// Обход в глубину, pre-order: имя родителя раньше имен его собственных
    /// зависимостей. Дубликаты не схлопываются - дедупликация происходит
    /// ниже, на in-flight проверках загрузки. Зависимости с уже загруженным
    /// модулем отсекаются без рекурсии: их собственные зависимости были
    /// загружены вместе с ними.
    ///
    /// Обход несет цепочку предков: повторная встреча имени из цепочки
    /// означает циклическое объявление и дает явную ошибку вместо
    /// бесконечной рекурсии.
    pub(crate) fn unloaded_dependency_names(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut chain = vec![descriptor.instance_name().to_string()];
        self.collect_unloaded(descriptor, &mut chain, &mut names)?;
        Ok(names)
    }

    fn collect_unloaded(
        &self,
        descriptor: &ServiceDescriptor,
        chain: &mut Vec<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        for spec in &descriptor.service_injections {
            // Custom и invalid инъекции модулей не несут
            let Some(dependency) = spec.service_instance_name() else {
                continue;
            };
            if self.state.modules.read().contains_key(dependency) {
                continue;
            }
            if chain.iter().any(|ancestor| ancestor == dependency) {
                chain.push(dependency.to_string());
                return Err(InjectorError::circular_dependency(chain));
            }

            out.push(dependency.to_string());

            // Ссылка без дескриптора попадает в список как есть: шаг
            // загрузки превратит ее в PathNotFound
            let Some(dependency_descriptor) = self.find_descriptor(dependency) else {
                continue;
            };
            chain.push(dependency.to_string());
            self.collect_unloaded(&dependency_descriptor, chain, out)?;
            chain.pop();
        }
        Ok(())
    }

    /// Загрузить модуль дескриптора и модули всех его незагруженных
    /// зависимостей.
    ///
    /// Загрузки выполняются конкурентно и запускаются жадно: fail-fast
    /// join может прервать вызов, но сестринские загрузки доработают
    /// независимо, а их результат останется мемоизированным.
    pub(crate) async fn resolve_modules(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        let mut names = self.unloaded_dependency_names(descriptor)?;
        names.push(descriptor.instance_name().to_string());
        debug!(service = %descriptor.instance_name(), modules = names.len(), "resolving modules");

        let loads: Vec<_> = names.iter().map(|name| self.load_module(name)).collect();
        for load in &loads {
            tokio::spawn(load.clone());
        }
        futures::future::try_join_all(loads).await?;
        Ok(())
    }

    /// Загрузка одного модуля с мемоизацией.
    ///
    /// Завершенные загрузки отдаются из кэша модулей; для идущих все
    /// конкурентные вызовы получают одну и ту же разделяемую операцию,
    /// так что accessor модуля вызывается не более одного раза на имя.
    pub(crate) fn load_module(&self, name: &str) -> SharedLoad<ServiceConstructor> {
        if let Some(constructor) = self.state.modules.read().get(name) {
            let constructor = constructor.clone();
            return futures::future::ready(Ok(constructor)).boxed().shared();
        }

        let mut loads = self.state.module_loads.lock();
        // Перепроверка под lock'ом: модуль мог загрузиться и освободить
        // свою in-flight запись пока брали mutex
        if let Some(constructor) = self.state.modules.read().get(name) {
            let constructor = constructor.clone();
            return futures::future::ready(Ok(constructor)).boxed().shared();
        }
        if let Some(load) = loads.get(name) {
            return load.clone();
        }

        let container = self.clone();
        let module_name = name.to_string();
        let load = async move { container.import_module(&module_name).await }
            .boxed()
            .shared();
        loads.insert(name.to_string(), load.clone());
        load
    }

    /// Фактический импорт: вызвать отложенный accessor и закэшировать
    /// конструктор
    async fn import_module(&self, name: &str) -> Result<ServiceConstructor> {
        // Нет дескриптора - нечего импортировать
        let Some(descriptor) = self.find_descriptor(name) else {
            return Err(InjectorError::path_not_found(name));
        };

        let accessor = descriptor.path_to_service.clone();
        let module = accessor()
            .await
            .map_err(|source| InjectorError::invalid_path(name, source.to_string()))?;

        let Some(constructor) = module.constructor else {
            return Err(InjectorError::path_not_found(name));
        };

        self.state
            .modules
            .write()
            .insert(name.to_string(), constructor.clone());
        debug!(module = %name, "module loaded");
        Ok(constructor)
    }
}
