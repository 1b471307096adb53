use crate::events::{HostEvent, TimerToken};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Отложенные одноразовые вызовы в том же цикле событий, что и движок.
///
/// Срабатывание таймера доставляется обратно как `HostEvent::GuardExpired(token)`,
/// поэтому обработчик выполняется атомарно между другими событиями.
pub trait TimerScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration);
    fn cancel(&mut self, token: TimerToken);
}

/// Таймеры на tokio: каждый таймер — спящая задача, отправляющая событие в канал
pub struct TokioTimerScheduler {
    tx: mpsc::Sender<HostEvent>,
    pending: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioTimerScheduler {
    pub fn new(tx: mpsc::Sender<HostEvent>) -> Self {
        Self {
            tx,
            pending: HashMap::new(),
        }
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        // Завершённые задачи больше не нужны
        self.pending.retain(|_, handle| !handle.is_finished());

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(HostEvent::GuardExpired(token)).await.is_err() {
                warn!("Цикл событий закрыт, таймер #{} потерян", token.0);
            }
        });
        self.pending.insert(token, handle);
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.pending.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimerScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

/// Ручной планировщик для тестов: таймеры срабатывают только по команде теста
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualTimers {
    pub pending: Vec<(TimerToken, Duration)>,
    pub cancelled: Vec<TimerToken>,
    pub scheduled_total: usize,
}

#[cfg(test)]
impl TimerScheduler for ManualTimers {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.scheduled_total += 1;
        self.pending.push((token, delay));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(pending, _)| *pending != token);
        self.cancelled.push(token);
    }
}

#[cfg(test)]
impl ManualTimers {
    /// Забрать самый старый таймер, будто он сработал
    pub fn take_next(&mut self) -> Option<TimerToken> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0).0)
        }
    }
}
