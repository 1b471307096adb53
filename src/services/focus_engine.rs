use crate::config::FocusConfig;
use crate::debug_if_enabled;
use crate::events::{Point, PointerSample, Rectangle, TimerToken, WindowId, WindowSnapshot};
use crate::services::host::WindowHost;
use crate::services::monitor_policy::{MonitorPolicy, MonitorTransition};
use crate::services::movement_guard::MovementGuard;
use crate::services::position_memory::PositionMemory;
use crate::services::timer::TimerScheduler;
use std::time::Instant;
use tracing::{error, info};

const DECORATED_TOLERANCE: i32 = 5;
const UNDECORATED_TOLERANCE: i32 = 20;
const DECORATED_MOVING_TOLERANCE: i32 = 10;
const UNDECORATED_MOVING_TOLERANCE: i32 = 40;

/// Почему перемещение указателя не выполнено
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRunning,
    NoWindow,
    AlreadyFocused,
    StaleFocus,
    WindowGone,
    Floating,
    PointerUnavailable,
    StayOnPrimary,
    OverBar,
    PointerOverWindow,
    OverviewVisible,
    WindowTooSmall,
    UserMoving,
    WarpFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDecision {
    Skip(SkipReason),
    Warp(Point),
}

/// Движок решений "указатель следует за фокусом".
///
/// Все входы — обычные синхронные вызовы из единого цикла событий; ошибок наружу
/// не бывает, любое невыполненное условие превращается в `FocusDecision::Skip`.
pub struct FocusEngine<H, T> {
    config: FocusConfig,
    host: H,
    timers: T,
    guard: MovementGuard,
    memory: PositionMemory,
    policy: MonitorPolicy,
    current_focused: Option<WindowId>,
    previous_focused: Option<WindowId>,
    running: bool,
}

impl<H: WindowHost, T: TimerScheduler> FocusEngine<H, T> {
    pub fn new(config: FocusConfig, host: H, timers: T) -> Self {
        let guard = MovementGuard::new(config.motion_event_timeout());
        Self {
            config,
            host,
            timers,
            guard,
            memory: PositionMemory::new(),
            policy: MonitorPolicy::new(),
            current_focused: None,
            previous_focused: None,
            running: false,
        }
    }

    pub fn start(&mut self) {
        info!("Включение движка следования за фокусом");
        self.guard.set_timeout(self.config.motion_event_timeout());
        self.running = true;
    }

    /// Остановка: отменяет таймер сторожа и полностью очищает состояние
    pub fn stop(&mut self) {
        info!("Выключение движка следования за фокусом");
        self.guard.reset(&mut self.timers);
        self.memory.clear();
        self.policy.clear();
        self.current_focused = None;
        self.previous_focused = None;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_motion(&mut self, sample: PointerSample) {
        if self.running {
            self.guard.on_motion(sample, &mut self.timers);
        }
    }

    pub fn on_guard_expired(&mut self, token: TimerToken) {
        self.guard.on_timer_fired(token);
    }

    pub fn on_window_unmanaged(&mut self, window: WindowId) {
        self.memory.forget(window);
        if self.previous_focused == Some(window) {
            self.previous_focused = None;
        }
    }

    pub fn on_focus_changed(&mut self, window: Option<WindowId>, now: Instant) -> FocusDecision {
        let decision = self.evaluate(window, now);
        match decision {
            FocusDecision::Warp(point) => debug_if_enabled!("Указатель перемещён в {}", point),
            FocusDecision::Skip(reason) => {
                debug_if_enabled!("Смена фокуса пропущена: {:?}", reason)
            }
        }
        decision
    }

    fn evaluate(&mut self, window: Option<WindowId>, now: Instant) -> FocusDecision {
        if !self.running {
            return FocusDecision::Skip(SkipReason::NotRunning);
        }

        let Some(id) = window else {
            return FocusDecision::Skip(SkipReason::NoWindow);
        };

        if self.current_focused == Some(id) {
            return FocusDecision::Skip(SkipReason::AlreadyFocused);
        }

        // Действуем только для окна, которое действительно сейчас в фокусе
        if self.host.focus_window() != Some(id) {
            return FocusDecision::Skip(SkipReason::StaleFocus);
        }

        let Some(target) = self.host.window_snapshot(id) else {
            return FocusDecision::Skip(SkipReason::WindowGone);
        };
        debug_if_enabled!("Фокус перешёл на {}", target);

        if target.is_floating {
            return FocusDecision::Skip(SkipReason::Floating);
        }

        self.previous_focused = self.current_focused;
        self.current_focused = Some(id);

        let pointer = match self.host.pointer() {
            Ok(pointer) => pointer,
            Err(e) => {
                debug_if_enabled!("Не удалось получить позицию указателя: {}", e);
                return FocusDecision::Skip(SkipReason::PointerUnavailable);
            }
        };

        if self.config.suppress_before_monitor_switch {
            if let Some(reason) = self.overview_or_size_reason(&target) {
                return FocusDecision::Skip(reason);
            }
        }

        let source = self.host.monitor_index_for_rect(Rectangle::around_point(pointer));
        let dest = self.host.monitor_index_for_rect(target.rect);

        if let (Some(source), Some(dest)) = (source, dest) {
            if source != dest {
                debug_if_enabled!("Фокус переключился на другой монитор: {} -> {}", source, dest);
                let primary = self.host.primary_monitor();
                let host = &self.host;
                let transition = self.policy.decide(source, dest, primary, |monitor| {
                    host.normal_window_count_on(monitor) > 0
                });

                // Смена монитора сама по себе повод переместить указатель
                return match transition {
                    MonitorTransition::StayOnPrimary => FocusDecision::Skip(SkipReason::StayOnPrimary),
                    MonitorTransition::Warp(_) => self.warp(&target, pointer),
                };
            }
        }

        if let Some(monitor) = dest.and_then(|index| self.host.monitor_geometry(index)) {
            if self.pointer_over_bar(pointer, &monitor) {
                return FocusDecision::Skip(SkipReason::OverBar);
            }
        }

        let tolerance = if target.has_decorations {
            DECORATED_TOLERANCE
        } else {
            UNDECORATED_TOLERANCE
        };
        if target.rect.contains_with_tolerance(pointer, tolerance) {
            return FocusDecision::Skip(SkipReason::PointerOverWindow);
        }

        if !self.config.suppress_before_monitor_switch {
            if let Some(reason) = self.overview_or_size_reason(&target) {
                return FocusDecision::Skip(reason);
            }
        }

        if self.guard.is_moving() || self.guard.is_recently_moving(now, pointer) {
            let moving_tolerance = if target.has_decorations {
                DECORATED_MOVING_TOLERANCE
            } else {
                UNDECORATED_MOVING_TOLERANCE
            };
            if target.rect.contains_with_tolerance(pointer, moving_tolerance) {
                return FocusDecision::Skip(SkipReason::UserMoving);
            }
            debug_if_enabled!("Мышь движется, но в стороне от окна, перемещаем");
        }

        let decision = self.warp(&target, pointer);
        if let (FocusDecision::Warp(_), Some(dest)) = (decision, dest) {
            self.policy.record(dest);
        }
        decision
    }

    fn overview_or_size_reason(&self, target: &WindowSnapshot) -> Option<SkipReason> {
        if self.host.overview_visible() {
            return Some(SkipReason::OverviewVisible);
        }

        let minimum = self.config.minimum_size_trigger;
        if target.rect.width < minimum && target.rect.height < minimum {
            return Some(SkipReason::WindowTooSmall);
        }

        None
    }

    /// Указатель над верхней или нижней панелью монитора
    fn pointer_over_bar(&self, pointer: Point, monitor: &Rectangle) -> bool {
        let top_bar = self.config.top_bar_height;
        let bottom_bar = self.config.bottom_bar_height;

        (top_bar > 0 && pointer.y < monitor.y + top_bar)
            || (bottom_bar > 0 && pointer.y >= monitor.bottom() - bottom_bar)
    }

    fn warp(&mut self, target: &WindowSnapshot, pointer: Point) -> FocusDecision {
        if self.config.warp_to_last_position {
            if let Some(previous) = self.previous_focused.filter(|previous| *previous != target.id) {
                if let Some(previous_window) = self.host.window_snapshot(previous) {
                    self.memory.save(previous, pointer, previous_window.rect);
                }
            }
        }

        let point = if self.config.warp_to_last_position {
            self.memory.load(target.id, target.rect)
        } else {
            target.rect.center()
        };

        if let Err(e) = self.host.warp_pointer(point) {
            error!("Не удалось переместить указатель в {}: {}", point, e);
            return FocusDecision::Skip(SkipReason::WarpFailed);
        }

        info!("Указатель перемещён в {} для окна {}", point, target);
        FocusDecision::Warp(point)
    }

    #[allow(dead_code)]
    pub fn current_focused(&self) -> Option<WindowId> {
        self.current_focused
    }

    #[allow(dead_code)]
    pub fn monitor_affinity(&self) -> Option<usize> {
        self.policy.affinity()
    }

    #[allow(dead_code)]
    pub fn is_mouse_moving(&self) -> bool {
        self.guard.is_moving()
    }

    #[allow(dead_code)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[cfg(test)]
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }
}
