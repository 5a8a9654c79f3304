//! Система ошибок IoC контейнера
//!
//! Единая таксономия ошибок для всего цикла загрузки сервиса:
//! поиск дескриптора -> импорт модуля -> сборка экземпляра -> post-build.
//! Никаких .unwrap() в рабочем коде - каждая точка отказа имеет
//! свой структурированный вариант.
//!
//! # АРХИТЕКТУРА ОШИБОК
//!
//! - **DefinitionNotFound**: ни один дескриптор не соответствует имени
//! - **InvalidInjection**: инъекция не является ни service reference, ни custom значением
//! - **InvalidPostBuildAction**: именованный post-build метод отсутствует у экземпляра
//! - **InvalidPath**: accessor модуля завершился ошибкой
//! - **PathNotFound**: accessor отработал, но конструктора в модуле нет
//! - **CircularDependency**: циклическое объявление зависимостей (обнаружено при обходе)
//! - **Construction / PostBuildFailed**: пробросы ошибок пользовательского кода
//!
//! Все варианты Clone: разделяемые in-flight операции повторяют свой
//! результат каждому ожидающему вызову, включая ошибочный.

use thiserror::Error;

/// Result alias для всех операций контейнера
pub type Result<T> = std::result::Result<T, InjectorError>;

/// Ошибки загрузки и сборки сервисов
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectorError {
    /// Запрошенное имя не соответствует ни одному дескриптору
    #[error("Service definition not found: '{name}'")]
    DefinitionNotFound { name: String },

    /// Инъекция не совпала ни с одной из двух допустимых форм
    #[error("Invalid injection for service '{class_name}': {injection}")]
    InvalidInjection {
        class_name: String,
        injection: String,
    },

    /// Именованное post-build действие отсутствует у собранного экземпляра
    #[error("Invalid post build action '{action}' for service '{class_name}'")]
    InvalidPostBuildAction {
        action: String,
        class_name: String,
    },

    /// Accessor модуля завершился ошибкой (битый путь, сбой импорта)
    #[error("Invalid path for service '{name}': {reason}")]
    InvalidPath { name: String, reason: String },

    /// Модуль не дал пригодного конструктора, либо дескриптора нет вовсе
    #[error("Path not found for service '{name}'")]
    PathNotFound { name: String },

    /// Цепочка объявлений ссылается сама на себя
    #[error("Circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    /// Конструктор сервиса вернул ошибку
    #[error("Constructor of service '{class_name}' failed: {reason}")]
    Construction {
        class_name: String,
        reason: String,
    },

    /// Post-build действие выполнилось и завершилось ошибкой
    #[error("Post build action '{action}' of service '{class_name}' failed: {reason}")]
    PostBuildFailed {
        action: String,
        class_name: String,
        reason: String,
    },
}

impl InjectorError {
    pub fn definition_not_found(name: impl Into<String>) -> Self {
        Self::DefinitionNotFound { name: name.into() }
    }

    pub fn invalid_injection(class_name: impl Into<String>, injection: impl Into<String>) -> Self {
        Self::InvalidInjection {
            class_name: class_name.into(),
            injection: injection.into(),
        }
    }

    pub fn invalid_post_build_action(
        action: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self::InvalidPostBuildAction {
            action: action.into(),
            class_name: class_name.into(),
        }
    }

    pub fn invalid_path(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn path_not_found(name: impl Into<String>) -> Self {
        Self::PathNotFound { name: name.into() }
    }

    /// Собрать ошибку цикла из цепочки имен обхода
    pub fn circular_dependency(chain: &[String]) -> Self {
        Self::CircularDependency {
            chain: chain.join(" -> "),
        }
    }

    pub fn construction(class_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            class_name: class_name.into(),
            reason: reason.into(),
        }
    }

    pub fn post_build_failed(
        action: impl Into<String>,
        class_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PostBuildFailed {
            action: action.into(),
            class_name: class_name.into(),
            reason: reason.into(),
        }
    }
}
