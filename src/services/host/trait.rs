use crate::config::Config;
use crate::error::Result;
use crate::events::{HostEvent, Point, Rectangle, WindowId, WindowSnapshot};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Запросы к оконному менеджеру и управление указателем
pub trait WindowHost {
    /// Окно, которое хост считает сфокусированным прямо сейчас
    fn focus_window(&self) -> Option<WindowId>;
    /// `None`, если окно уже уничтожено
    fn window_snapshot(&self, id: WindowId) -> Option<WindowSnapshot>;
    fn pointer(&self) -> Result<Point>;
    fn warp_pointer(&mut self, target: Point) -> Result<()>;
    fn monitor_index_for_rect(&self, rect: Rectangle) -> Option<usize>;
    fn monitor_geometry(&self, index: usize) -> Option<Rectangle>;
    fn primary_monitor(&self) -> usize;
    /// Число обычных окон активного рабочего стола на мониторе
    fn normal_window_count_on(&self, monitor: usize) -> usize;
    fn overview_visible(&self) -> bool;

    // Сквозные операции для удалённых команд
    fn focus_workspace(&mut self, index: u32) -> Result<()>;
    fn hide_overview(&mut self) -> Result<()>;
    fn clear_notifications(&mut self) -> Result<()>;
}

impl<H: WindowHost + ?Sized> WindowHost for Box<H> {
    fn focus_window(&self) -> Option<WindowId> {
        (**self).focus_window()
    }

    fn window_snapshot(&self, id: WindowId) -> Option<WindowSnapshot> {
        (**self).window_snapshot(id)
    }

    fn pointer(&self) -> Result<Point> {
        (**self).pointer()
    }

    fn warp_pointer(&mut self, target: Point) -> Result<()> {
        (**self).warp_pointer(target)
    }

    fn monitor_index_for_rect(&self, rect: Rectangle) -> Option<usize> {
        (**self).monitor_index_for_rect(rect)
    }

    fn monitor_geometry(&self, index: usize) -> Option<Rectangle> {
        (**self).monitor_geometry(index)
    }

    fn primary_monitor(&self) -> usize {
        (**self).primary_monitor()
    }

    fn normal_window_count_on(&self, monitor: usize) -> usize {
        (**self).normal_window_count_on(monitor)
    }

    fn overview_visible(&self) -> bool {
        (**self).overview_visible()
    }

    fn focus_workspace(&mut self, index: u32) -> Result<()> {
        (**self).focus_workspace(index)
    }

    fn hide_overview(&mut self) -> Result<()> {
        (**self).hide_overview()
    }

    fn clear_notifications(&mut self) -> Result<()> {
        (**self).clear_notifications()
    }
}

/// Trait for signal sources that translate host notifications into HostEvents
#[async_trait::async_trait]
pub trait SignalSourceTrait {
    /// Run the signal source until the receiving side is closed
    async fn run(self: Box<Self>, tx: mpsc::Sender<HostEvent>) -> Result<()>;
}

pub struct Backend {
    pub host: Box<dyn WindowHost + Send>,
    pub signals: Box<dyn SignalSourceTrait + Send>,
}

/// Factory function to create the backend based on the dry_run flag and config
pub fn create_backend(config: Arc<Config>, dry_run: bool) -> Result<Backend> {
    if dry_run || config.backend.mode == "dry-run" {
        let desktop = super::dry_run::SimulatedDesktop::shared();
        Ok(Backend {
            host: Box::new(super::dry_run::DryRunHost::new(desktop.clone())),
            signals: Box::new(super::dry_run::DryRunSignalSource::new(desktop)),
        })
    } else {
        super::x11::X11Host::check_available()?;
        Ok(Backend {
            host: Box::new(super::x11::X11Host::new()),
            signals: Box::new(super::x11::X11SignalSource::new(config)),
        })
    }
}
