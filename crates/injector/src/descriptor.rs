//! Дескрипторы сервисов
//!
//! Декларативная часть контейнера. Дескрипторы поставляются один раз при
//! инициализации и дальше только читаются. Wire-формат декларативных полей
//! (camelCase имена) сохранён через serde rename, чтобы фрагменты
//! конфигурации, написанные руками в JSON, десериализовались как есть.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::ModuleAccessor;

/// Спецификация одной инъекции конструктора.
///
/// Tagged union из двух допустимых форм плюс `Invalid` - ветка для
/// конфигураций, собранных вне системы типов (десериализация JSON).
/// Untagged порядок важен: формы проверяются сверху вниз, всё что не
/// совпало - падает в `Invalid` и превращается в ошибку при сборке.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InjectionSpec {
    /// Ссылка на другой управляемый singleton
    ServiceRef {
        #[serde(rename = "serviceInstanceName")]
        service_instance_name: String,
    },
    /// Literal значение, передаваемое в конструктор без разрешения
    Custom {
        #[serde(rename = "customInjection")]
        custom_injection: Value,
    },
    /// Ни одна из форм не совпала
    Invalid(Value),
}

impl InjectionSpec {
    pub fn service_ref(name: impl Into<String>) -> Self {
        Self::ServiceRef {
            service_instance_name: name.into(),
        }
    }

    pub fn custom(value: impl Into<Value>) -> Self {
        Self::Custom {
            custom_injection: value.into(),
        }
    }

    /// Имя сервиса, если инъекция является ссылкой
    pub fn service_instance_name(&self) -> Option<&str> {
        match self {
            Self::ServiceRef {
                service_instance_name,
            } => Some(service_instance_name),
            _ => None,
        }
    }
}

/// Статическое объявление одного сервиса
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Идентификатор реализации; ключ кэша по умолчанию
    pub service_class_name: String,
    /// Явное имя экземпляра; None - использовать имя класса
    pub service_instance_name: Option<String>,
    /// Инъекции конструктора; порядок определяет порядок аргументов
    pub service_injections: Vec<InjectionSpec>,
    /// Имена post-build действий, выполняемых последовательно
    pub post_build_async_actions: Vec<String>,
    /// Отложенный accessor модуля реализации
    pub path_to_service: ModuleAccessor,
}

impl ServiceDescriptor {
    pub fn new(class_name: impl Into<String>, path_to_service: ModuleAccessor) -> Self {
        Self {
            service_class_name: class_name.into(),
            service_instance_name: None,
            service_injections: Vec::new(),
            post_build_async_actions: Vec::new(),
            path_to_service,
        }
    }

    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.service_instance_name = Some(name.into());
        self
    }

    pub fn with_injection(mut self, spec: InjectionSpec) -> Self {
        self.service_injections.push(spec);
        self
    }

    pub fn with_service_injection(self, name: impl Into<String>) -> Self {
        self.with_injection(InjectionSpec::service_ref(name))
    }

    pub fn with_custom_injection(self, value: impl Into<Value>) -> Self {
        self.with_injection(InjectionSpec::custom(value))
    }

    pub fn with_post_build_action(mut self, action: impl Into<String>) -> Self {
        self.post_build_async_actions.push(action.into());
        self
    }

    /// Эффективное имя экземпляра: явное либо имя класса
    pub fn instance_name(&self) -> &str {
        self.service_instance_name
            .as_deref()
            .unwrap_or(&self.service_class_name)
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_class_name", &self.service_class_name)
            .field("service_instance_name", &self.service_instance_name)
            .field("service_injections", &self.service_injections)
            .field("post_build_async_actions", &self.post_build_async_actions)
            .finish_non_exhaustive()
    }
}

/// Поиск дескриптора по имени: первое совпадение в порядке таблицы.
///
/// Дескриптор соответствует имени если его явное имя экземпляра равно
/// имени, либо - при отсутствии явного имени - равно имя класса.
/// Поведение при дублирующихся именах не определено: уникальность имен -
/// контракт конфигурации.
pub(crate) fn find_descriptor<'a>(
    table: &'a [ServiceDescriptor],
    name: &str,
) -> Option<&'a ServiceDescriptor> {
    table.iter().find(|descriptor| {
        match &descriptor.service_instance_name {
            Some(instance_name) => instance_name == name,
            None => descriptor.service_class_name == name,
        }
    })
}
