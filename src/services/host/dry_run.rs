use crate::error::Result;
use crate::events::geometry::monitor_index_for_rect;
use crate::events::{HostEvent, Point, PointerSample, Rectangle, WindowId, WindowSnapshot};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::{SignalSourceTrait, WindowHost};

/// Эмулируемый рабочий стол с двумя мониторами
#[derive(Debug)]
pub struct SimulatedDesktop {
    pub monitors: Vec<Rectangle>,
    pub primary: usize,
    pub windows: BTreeMap<WindowId, WindowSnapshot>,
    pub focus: Option<WindowId>,
    pub pointer: Point,
    pub overview: bool,
    pub workspace: u32,
}

impl SimulatedDesktop {
    pub fn shared() -> Arc<RwLock<Self>> {
        let windows = [
            WindowSnapshot::new(WindowId(0x100), Rectangle::new(100, 100, 800, 600))
                .with_title("Terminal - dry_run"),
            WindowSnapshot::new(WindowId(0x200), Rectangle::new(1000, 200, 800, 700))
                .with_title("Browser - dry_run"),
            WindowSnapshot::new(WindowId(0x300), Rectangle::new(2020, 100, 1200, 800))
                .with_title("Editor - dry_run"),
            WindowSnapshot::new(WindowId(0x400), Rectangle::new(2400, 300, 900, 600))
                .with_title("Game - dry_run")
                .with_decorations(false),
        ];

        Arc::new(RwLock::new(Self {
            monitors: vec![
                Rectangle::new(0, 0, 1920, 1080),
                Rectangle::new(1920, 0, 1920, 1080),
            ],
            primary: 0,
            windows: windows.into_iter().map(|window| (window.id, window)).collect(),
            focus: None,
            pointer: Point::new(960, 540),
            overview: false,
            workspace: 0,
        }))
    }
}

pub struct DryRunHost {
    desktop: Arc<RwLock<SimulatedDesktop>>,
}

impl DryRunHost {
    pub fn new(desktop: Arc<RwLock<SimulatedDesktop>>) -> Self {
        Self { desktop }
    }
}

impl WindowHost for DryRunHost {
    fn focus_window(&self) -> Option<WindowId> {
        self.desktop.read().focus
    }

    fn window_snapshot(&self, id: WindowId) -> Option<WindowSnapshot> {
        self.desktop.read().windows.get(&id).cloned()
    }

    fn pointer(&self) -> Result<Point> {
        Ok(self.desktop.read().pointer)
    }

    fn warp_pointer(&mut self, target: Point) -> Result<()> {
        info!("[DRY RUN] Перемещение указателя в {}", target);
        self.desktop.write().pointer = target;
        Ok(())
    }

    fn monitor_index_for_rect(&self, rect: Rectangle) -> Option<usize> {
        monitor_index_for_rect(&self.desktop.read().monitors, &rect)
    }

    fn monitor_geometry(&self, index: usize) -> Option<Rectangle> {
        self.desktop.read().monitors.get(index).copied()
    }

    fn primary_monitor(&self) -> usize {
        self.desktop.read().primary
    }

    fn normal_window_count_on(&self, monitor: usize) -> usize {
        let desktop = self.desktop.read();
        desktop
            .windows
            .values()
            .filter(|window| window.is_normal())
            .filter(|window| monitor_index_for_rect(&desktop.monitors, &window.rect) == Some(monitor))
            .count()
    }

    fn overview_visible(&self) -> bool {
        self.desktop.read().overview
    }

    fn focus_workspace(&mut self, index: u32) -> Result<()> {
        info!("[DRY RUN] Переключение на рабочий стол {}", index);
        self.desktop.write().workspace = index;
        Ok(())
    }

    fn hide_overview(&mut self) -> Result<()> {
        info!("[DRY RUN] Скрытие обзора");
        self.desktop.write().overview = false;
        Ok(())
    }

    fn clear_notifications(&mut self) -> Result<()> {
        info!("[DRY RUN] Очистка уведомлений");
        Ok(())
    }
}

/// Источник событий, эмулирующий смену фокуса и движение мыши
pub struct DryRunSignalSource {
    desktop: Arc<RwLock<SimulatedDesktop>>,
}

impl DryRunSignalSource {
    pub fn new(desktop: Arc<RwLock<SimulatedDesktop>>) -> Self {
        Self { desktop }
    }

    async fn run_impl(self, tx: mpsc::Sender<HostEvent>) -> Result<()> {
        info!("Dry-run режим - источник событий работает в режиме эмуляции");

        let windows: Vec<WindowSnapshot> = self.desktop.read().windows.values().cloned().collect();
        for window in &windows {
            if tx.send(HostEvent::WindowCreated(window.clone())).await.is_err() {
                return Ok(());
            }
        }

        let mut window_index = 0;
        let mut tick: u64 = 0;
        let mut interval = interval(Duration::from_secs(3));

        loop {
            interval.tick().await;
            tick += 1;

            // Каждый третий такт эмулируем движение мыши перед сменой фокуса
            if tick % 3 == 0 {
                let start = self.desktop.read().pointer;
                for step in 1..=5 {
                    let position = Point::new(start.x + step * 4, start.y + step * 2);
                    self.desktop.write().pointer = position;
                    if tx.send(HostEvent::Motion(PointerSample::now(position))).await.is_err() {
                        return Ok(());
                    }
                }
            }

            let window = &windows[window_index];
            // Каждый пятый такт фокус меняется при открытом обзоре
            let in_overview = tick % 5 == 0;
            if in_overview {
                info!("Dry-run: открыт обзор");
                self.desktop.write().overview = true;
            }

            info!("Dry-run: эмулируем смену фокуса на: {}", window);
            self.desktop.write().focus = Some(window.id);
            if tx.send(HostEvent::FocusChanged(Some(window.id))).await.is_err() {
                return Ok(());
            }

            if in_overview {
                info!("Dry-run: обзор скрыт");
                self.desktop.write().overview = false;
                if tx.send(HostEvent::OverviewHidden(Some(window.id))).await.is_err() {
                    return Ok(());
                }
            }

            window_index = (window_index + 1) % windows.len();
        }
    }
}

#[async_trait::async_trait]
impl SignalSourceTrait for DryRunSignalSource {
    async fn run(self: Box<Self>, tx: mpsc::Sender<HostEvent>) -> Result<()> {
        (*self).run_impl(tx).await
    }
}
