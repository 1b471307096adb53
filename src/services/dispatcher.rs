use crate::config::FocusConfig;
use crate::debug_if_enabled;
use crate::events::{HostEvent, WindowId};
use crate::services::focus_engine::FocusEngine;
use crate::services::host::WindowHost;
use crate::services::remote::RemoteCommand;
use crate::services::timer::TimerScheduler;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Единый цикл событий: владеет движком и применяет события строго по порядку.
///
/// Также ведёт учёт окон, на фокус которых мы "подписаны": только обычные окна.
pub struct FocusDispatcher<H, T> {
    engine: FocusEngine<H, T>,
    tracked: HashSet<WindowId>,
}

impl<H: WindowHost, T: TimerScheduler> FocusDispatcher<H, T> {
    pub fn new(config: FocusConfig, host: H, timers: T) -> Self {
        Self {
            engine: FocusEngine::new(config, host, timers),
            tracked: HashSet::new(),
        }
    }

    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        mut commands: mpsc::Receiver<RemoteCommand>,
    ) {
        self.engine.start();
        info!("Цикл событий запущен");

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    if !self.handle_event(event) {
                        break;
                    }
                }
                Some(command) = commands.recv() => self.handle_command(command),
                else => break,
            }
        }

        if self.engine.is_running() {
            self.shutdown();
        }
        info!("Цикл событий завершён");
    }

    /// Возвращает `false`, когда цикл должен завершиться
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        debug_if_enabled!("Событие хоста: {}", event);

        match event {
            HostEvent::WindowCreated(window) => {
                if window.is_normal() {
                    debug_if_enabled!("Подключаемся к окну {}", window);
                    self.tracked.insert(window.id);
                } else {
                    debug_if_enabled!("Игнорируем окно типа {:?}: {}", window.window_type, window);
                }
            }
            HostEvent::FocusChanged(Some(id)) if !self.tracked.contains(&id) => {
                debug_if_enabled!("Фокус на неотслеживаемом окне {}, пропускаем", id);
            }
            HostEvent::FocusChanged(window) => {
                self.engine.on_focus_changed(window, Instant::now());
            }
            // Обзор скрыт: хост повторяет последний фокус
            HostEvent::OverviewHidden(window) => {
                self.engine.on_focus_changed(window, Instant::now());
            }
            HostEvent::WindowUnmanaged(id) => {
                self.tracked.remove(&id);
                self.engine.on_window_unmanaged(id);
            }
            HostEvent::Motion(sample) => self.engine.on_motion(sample),
            HostEvent::GuardExpired(token) => self.engine.on_guard_expired(token),
            HostEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }

        true
    }

    pub fn handle_command(&mut self, command: RemoteCommand) {
        info!("Выполнение удалённой команды: {:?}", command);

        let host = self.engine.host_mut();
        let result = match command {
            RemoteCommand::FocusWorkspace(index) => host.focus_workspace(index),
            RemoteCommand::HideOverview => host.hide_overview(),
            RemoteCommand::ClearNotifications => host.clear_notifications(),
        };

        if let Err(e) = result {
            error!("Удалённая команда {:?} не выполнена: {}", command, e);
        }
    }

    fn shutdown(&mut self) {
        info!("Отключение от {} окон", self.tracked.len());
        self.tracked.clear();
        self.engine.stop();
    }

    #[allow(dead_code)]
    pub fn engine(&self) -> &FocusEngine<H, T> {
        &self.engine
    }

    #[allow(dead_code)]
    pub fn tracked_windows(&self) -> usize {
        self.tracked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FocusConfig;
    use crate::events::{Point, PointerSample, Rectangle, WindowSnapshot, WindowType};
    use crate::services::focus_engine::tests::FakeHost;
    use crate::services::timer::ManualTimers;

    fn dispatcher() -> FocusDispatcher<FakeHost, ManualTimers> {
        let mut host = FakeHost::dual_monitor();
        host.add_window(WindowSnapshot::new(WindowId(1), Rectangle::new(100, 100, 800, 600)));
        host.add_window(
            WindowSnapshot::new(WindowId(2), Rectangle::new(1000, 100, 300, 300))
                .with_type(WindowType::Dialog),
        );
        host.pointer = Point::new(1500, 900);

        let mut dispatcher = FocusDispatcher::new(FocusConfig::default(), host, ManualTimers::default());
        dispatcher.engine.start();
        dispatcher
    }

    fn created(dispatcher: &FocusDispatcher<FakeHost, ManualTimers>, id: u64) -> HostEvent {
        HostEvent::WindowCreated(dispatcher.engine().host().windows[&WindowId(id)].clone())
    }

    #[test]
    fn test_only_normal_windows_are_tracked() {
        let mut dispatcher = dispatcher();
        let first = created(&dispatcher, 1);
        let second = created(&dispatcher, 2);

        assert!(dispatcher.handle_event(first));
        assert!(dispatcher.handle_event(second));
        assert_eq!(dispatcher.tracked_windows(), 1);

        // Фокус диалога не отслеживается
        dispatcher.engine.host_mut().focus = Some(WindowId(2));
        dispatcher.handle_event(HostEvent::FocusChanged(Some(WindowId(2))));
        assert!(dispatcher.engine().host().warps.is_empty());

        dispatcher.engine.host_mut().focus = Some(WindowId(1));
        dispatcher.handle_event(HostEvent::FocusChanged(Some(WindowId(1))));
        assert_eq!(dispatcher.engine().host().warps, vec![Point::new(500, 400)]);
    }

    #[test]
    fn test_overview_hidden_reuses_focus_path() {
        let mut dispatcher = dispatcher();
        dispatcher.engine.host_mut().focus = Some(WindowId(1));

        // Обзор не требует подписки на окно
        dispatcher.handle_event(HostEvent::OverviewHidden(Some(WindowId(1))));
        dispatcher.handle_event(HostEvent::OverviewHidden(Some(WindowId(1))));

        assert_eq!(dispatcher.engine().host().warps.len(), 1);
    }

    #[test]
    fn test_unmanaged_window_is_untracked() {
        let mut dispatcher = dispatcher();
        let first = created(&dispatcher, 1);
        dispatcher.handle_event(first);
        dispatcher.handle_event(HostEvent::WindowUnmanaged(WindowId(1)));

        assert_eq!(dispatcher.tracked_windows(), 0);
    }

    #[test]
    fn test_motion_and_guard_expiry() {
        let mut dispatcher = dispatcher();

        dispatcher.handle_event(HostEvent::Motion(PointerSample::now(Point::new(5, 5))));
        assert!(dispatcher.engine().is_mouse_moving());

        let token = dispatcher.engine.timers_mut().take_next().unwrap();
        dispatcher.handle_event(HostEvent::GuardExpired(token));
        assert!(!dispatcher.engine().is_mouse_moving());
    }

    #[test]
    fn test_remote_commands_reach_host() {
        let mut dispatcher = dispatcher();

        dispatcher.handle_command(RemoteCommand::FocusWorkspace(3));
        dispatcher.handle_command(RemoteCommand::HideOverview);
        dispatcher.handle_command(RemoteCommand::ClearNotifications);

        assert_eq!(
            dispatcher.engine().host().remote_calls,
            vec!["focus_workspace:3", "hide_overview", "clear_notifications"]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut host = FakeHost::dual_monitor();
        host.add_window(WindowSnapshot::new(WindowId(1), Rectangle::new(100, 100, 800, 600)));
        let dispatcher = FocusDispatcher::new(FocusConfig::default(), host, ManualTimers::default());

        let (event_tx, event_rx) = mpsc::channel(8);
        let (_command_tx, command_rx) = mpsc::channel(8);
        let handle = tokio::spawn(dispatcher.run(event_rx, command_rx));

        event_tx
            .send(HostEvent::Motion(PointerSample::now(Point::new(1, 1))))
            .await
            .unwrap();
        event_tx.send(HostEvent::Shutdown).await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
