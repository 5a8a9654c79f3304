//! Статистика контейнера

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Снимок состояния контейнера на момент вызова `stats()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// Количество известных имен сервисов (таблица SERVICES)
    pub known_services: usize,
    /// Загруженные модули
    pub loaded_modules: usize,
    /// Собранные singleton экземпляры
    pub cached_instances: usize,
    /// Попадания в singleton кэш
    pub cache_hits: u64,
    /// Промахи singleton кэша
    pub cache_misses: u64,
    /// Загрузки модулей в полете
    pub modules_in_flight: usize,
    /// Загрузки экземпляров в полете
    pub instances_in_flight: usize,
}

/// Внутренние счетчики; снимаются в `ContainerStats`
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) cache_hits: AtomicU64,
    pub(crate) cache_misses: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    pub(crate) fn hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub(crate) fn misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }
}
