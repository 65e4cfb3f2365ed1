use std::time::Duration;

use crate::config::{DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF};

/// Политика ожидания при троттлинге провайдера.
///
/// `ceiling = None` - задержка растёт без ограничения, попыток тоже без лимита:
/// провайдера пережидаем, а не падаем.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BackoffPolicy {
    pub(crate) initial: Duration,
    pub(crate) multiplier: f64,
    pub(crate) ceiling: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_BACKOFF,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            ceiling: None,
        }
    }
}

/// Текущее состояние ожидания (сколько спать при следующем троттлинге)
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(policy: BackoffPolicy) -> Self {
        let current = policy.initial;
        Self { policy, current }
    }

    pub(crate) fn current(&self) -> Duration {
        self.current
    }

    /// Вернуть задержку для текущего ожидания и увеличить следующую
    pub(crate) fn advance(&mut self) -> Duration {
        let delay = self.current;
        let next = Duration::try_from_secs_f64(delay.as_secs_f64() * self.policy.multiplier)
            .unwrap_or(Duration::MAX);
        self.current = match self.policy.ceiling {
            Some(cap) => next.min(cap),
            None => next,
        };
        delay
    }

    /// Первый успех после серии троттлингов
    pub(crate) fn reset(&mut self) {
        self.current = self.policy.initial;
    }
}

/// Чем ждать между попытками
pub(crate) trait Pause {
    fn pause(&self, delay: Duration);
}

/// Обычный блокирующий sleep: сессия стоит, пока ждём провайдера
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}
