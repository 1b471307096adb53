use crate::events::{Point, PointerSample, TimerToken};
use crate::services::timer::TimerScheduler;
use crate::trace_if_enabled;
use std::time::{Duration, Instant};
use tracing::debug;

/// Порог "недавнего" движения после закрытия основного окна сторожа
pub const RECENT_MOTION_THRESHOLD: Duration = Duration::from_millis(150);
/// Минимальное смещение, которое считается движением
pub const RECENT_MOTION_MIN_DISTANCE: f64 = 3.0;

/// Сторож движения мыши.
///
/// Первое событие движения поднимает флаг `is_moving` и взводит одноразовый таймер
/// на `timeout`. Повторные события, пока флаг поднят, таймер не перевзводят.
/// Флаг сбрасывается только срабатыванием текущего таймера.
#[derive(Debug)]
pub struct MovementGuard {
    timeout: Duration,
    is_moving: bool,
    armed: Option<TimerToken>,
    next_token: u64,
    last_sample: Option<PointerSample>,
}

impl MovementGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            is_moving: false,
            armed: None,
            next_token: 0,
            last_sample: None,
        }
    }

    pub fn on_motion(&mut self, sample: PointerSample, timers: &mut dyn TimerScheduler) {
        self.last_sample = Some(sample);

        if self.is_moving {
            trace_if_enabled!("Движение продолжается, таймер сторожа не перевзводится");
            return;
        }

        debug!("Сторож движения мыши поднят");
        self.is_moving = true;

        // Не больше одного ожидающего таймера
        if let Some(previous) = self.armed.take() {
            timers.cancel(previous);
        }

        self.next_token += 1;
        let token = TimerToken(self.next_token);
        timers.schedule(token, self.timeout);
        self.armed = Some(token);
    }

    /// Срабатывание таймера. Чужой или устаревший токен игнорируется.
    pub fn on_timer_fired(&mut self, token: TimerToken) -> bool {
        if self.armed != Some(token) {
            debug!("Устаревший таймер сторожа #{} проигнорирован", token.0);
            return false;
        }

        debug!("Сторож движения мыши опущен по таймауту");
        self.armed = None;
        self.is_moving = false;
        true
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Движение закончилось совсем недавно, и указатель с тех пор заметно сдвинулся
    pub fn is_recently_moving(&self, now: Instant, pointer: Point) -> bool {
        self.is_recently_moving_with(now, pointer, RECENT_MOTION_THRESHOLD, RECENT_MOTION_MIN_DISTANCE)
    }

    pub fn is_recently_moving_with(
        &self,
        now: Instant,
        pointer: Point,
        threshold: Duration,
        min_distance: f64,
    ) -> bool {
        match self.last_sample {
            Some(sample) => {
                now.saturating_duration_since(sample.timestamp) < threshold
                    && sample.position.distance(pointer) > min_distance
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn last_sample(&self) -> Option<PointerSample> {
        self.last_sample
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Сброс при остановке движка: отменяет ожидающий таймер
    pub fn reset(&mut self, timers: &mut dyn TimerScheduler) {
        if let Some(token) = self.armed.take() {
            timers.cancel(token);
        }
        self.is_moving = false;
        self.last_sample = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::timer::ManualTimers;

    fn sample_at(base: Instant, ms: u64, x: i32, y: i32) -> PointerSample {
        PointerSample::new(Point::new(x, y), base + Duration::from_millis(ms))
    }

    #[test]
    fn test_first_motion_arms_single_timer() {
        let base = Instant::now();
        let mut timers = ManualTimers::default();
        let mut guard = MovementGuard::new(Duration::from_millis(100));

        assert!(!guard.is_moving());
        guard.on_motion(sample_at(base, 0, 10, 10), &mut timers);
        guard.on_motion(sample_at(base, 10, 12, 10), &mut timers);
        guard.on_motion(sample_at(base, 20, 14, 10), &mut timers);

        assert!(guard.is_moving());
        assert_eq!(timers.scheduled_total, 1);
        assert_eq!(timers.pending[0].1, Duration::from_millis(100));
        assert_eq!(guard.last_sample().unwrap().position, Point::new(14, 10));
    }

    #[test]
    fn test_timer_fire_clears_guard_and_allows_rearm() {
        let base = Instant::now();
        let mut timers = ManualTimers::default();
        let mut guard = MovementGuard::new(Duration::from_millis(100));

        guard.on_motion(sample_at(base, 0, 0, 0), &mut timers);
        let token = timers.take_next().unwrap();
        assert!(guard.on_timer_fired(token));
        assert!(!guard.is_moving());

        guard.on_motion(sample_at(base, 200, 5, 5), &mut timers);
        assert!(guard.is_moving());
        assert_eq!(timers.scheduled_total, 2);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let base = Instant::now();
        let mut timers = ManualTimers::default();
        let mut guard = MovementGuard::new(Duration::from_millis(100));

        guard.on_motion(sample_at(base, 0, 0, 0), &mut timers);
        let first = timers.take_next().unwrap();
        guard.reset(&mut timers);
        guard.on_motion(sample_at(base, 10, 0, 0), &mut timers);

        // Таймер первого взвода пришёл после сброса
        assert!(!guard.on_timer_fired(first));
        assert!(guard.is_moving());
    }

    #[test]
    fn test_reset_cancels_pending_timer() {
        let base = Instant::now();
        let mut timers = ManualTimers::default();
        let mut guard = MovementGuard::new(Duration::from_millis(100));

        guard.on_motion(sample_at(base, 0, 0, 0), &mut timers);
        guard.reset(&mut timers);

        assert!(timers.pending.is_empty());
        assert_eq!(timers.cancelled.len(), 1);
        assert!(!guard.is_moving());
        assert!(guard.last_sample().is_none());
    }

    #[test]
    fn test_recently_moving() {
        let base = Instant::now();
        let mut timers = ManualTimers::default();
        let mut guard = MovementGuard::new(Duration::from_millis(100));

        assert!(!guard.is_recently_moving(base, Point::new(0, 0)));

        guard.on_motion(sample_at(base, 0, 100, 100), &mut timers);

        let soon = base + Duration::from_millis(120);
        let late = base + Duration::from_millis(200);
        assert!(guard.is_recently_moving(soon, Point::new(110, 100)));
        // Указатель на месте последнего события
        assert!(!guard.is_recently_moving(soon, Point::new(101, 101)));
        assert!(!guard.is_recently_moving(late, Point::new(110, 100)));
    }
}
