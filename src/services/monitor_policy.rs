use tracing::debug;

/// Решение при переходе фокуса на другой монитор
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorTransition {
    Warp(usize),
    StayOnPrimary,
}

/// Политика переходов между мониторами и запомненный "активный" монитор
#[derive(Debug, Default)]
pub struct MonitorPolicy {
    affinity: Option<usize>,
}

impl MonitorPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Вызывается только при `source != dest`.
    ///
    /// Не уводим указатель с основного монитора, если на нём в активном рабочем
    /// столе не осталось обычных окон: фокус на втором мониторе, скорее всего,
    /// случайный.
    pub fn decide(
        &mut self,
        source: usize,
        dest: usize,
        primary: usize,
        has_windows_on: impl Fn(usize) -> bool,
    ) -> MonitorTransition {
        if source == primary && dest != primary && !has_windows_on(primary) {
            debug!(
                "На основном мониторе {} не осталось окон, остаёмся на нём",
                primary
            );
            self.affinity = Some(primary);
            return MonitorTransition::StayOnPrimary;
        }

        self.affinity = Some(dest);
        MonitorTransition::Warp(dest)
    }

    pub fn record(&mut self, monitor: usize) {
        self.affinity = Some(monitor);
    }

    pub fn affinity(&self) -> Option<usize> {
        self.affinity
    }

    pub fn clear(&mut self) {
        self.affinity = None;
    }
}
