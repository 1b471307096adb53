use super::geometry::Rectangle;
use super::pointer::PointerSample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Стабильный непрозрачный идентификатор окна верхнего уровня
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Тип окна, как его сообщает оконный менеджер
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    Normal,
    Dialog,
    Utility,
    Tooltip,
    Dock,
    Other,
}

impl WindowType {
    /// Разбор атома `_NET_WM_WINDOW_TYPE_*`
    pub fn from_atom(atom: &str) -> Self {
        match atom.trim().trim_start_matches("_NET_WM_WINDOW_TYPE_") {
            "NORMAL" => WindowType::Normal,
            "DIALOG" => WindowType::Dialog,
            "UTILITY" => WindowType::Utility,
            "TOOLTIP" => WindowType::Tooltip,
            "DOCK" => WindowType::Dock,
            _ => WindowType::Other,
        }
    }
}

/// Снимок состояния окна в момент смены фокуса. Не изменяется после создания.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub rect: Rectangle,
    pub has_decorations: bool,
    pub is_floating: bool,
    pub window_type: WindowType,
    pub title: String,
}

impl WindowSnapshot {
    pub fn new(id: WindowId, rect: Rectangle) -> Self {
        Self {
            id,
            rect,
            has_decorations: true,
            is_floating: false,
            window_type: WindowType::Normal,
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_decorations(mut self, has_decorations: bool) -> Self {
        self.has_decorations = has_decorations;
        self
    }

    #[allow(dead_code)]
    pub fn with_floating(mut self, is_floating: bool) -> Self {
        self.is_floating = is_floating;
        self
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn is_normal(&self) -> bool {
        self.window_type == WindowType::Normal
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{} [{}]", self.id, self.rect)
        } else {
            write!(f, "\"{}\" {} [{}]", self.title, self.id, self.rect)
        }
    }
}

/// Токен отложенного таймера сторожа движения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Событие хоста, доставляемое в единый цикл обработки
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    WindowCreated(WindowSnapshot),
    FocusChanged(Option<WindowId>),
    WindowUnmanaged(WindowId),
    Motion(PointerSample),
    /// Обзор скрыт: хост повторно сообщает текущее окно с фокусом
    OverviewHidden(Option<WindowId>),
    GuardExpired(TimerToken),
    Shutdown,
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::WindowCreated(window) => write!(f, "WindowCreated: {}", window),
            HostEvent::FocusChanged(Some(id)) => write!(f, "FocusChanged: {}", id),
            HostEvent::FocusChanged(None) => write!(f, "FocusChanged: none"),
            HostEvent::WindowUnmanaged(id) => write!(f, "WindowUnmanaged: {}", id),
            HostEvent::Motion(sample) => write!(f, "Motion: {}", sample.position),
            HostEvent::OverviewHidden(_) => write!(f, "OverviewHidden"),
            HostEvent::GuardExpired(token) => write!(f, "GuardExpired: #{}", token.0),
            HostEvent::Shutdown => write!(f, "Shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_snapshot_creation() {
        let window = WindowSnapshot::new(WindowId(0x3a00003), Rectangle::new(0, 0, 600, 400))
            .with_title("Terminal")
            .with_decorations(false)
            .with_floating(true);

        assert_eq!(window.title, "Terminal");
        assert!(!window.has_decorations);
        assert!(window.is_floating);
        assert!(window.is_normal());
        assert_eq!(window.to_string(), "\"Terminal\" 0x3a00003 [600x400+0+0]");
    }

    #[test]
    fn test_window_type_from_atom() {
        assert_eq!(WindowType::from_atom("_NET_WM_WINDOW_TYPE_NORMAL"), WindowType::Normal);
        assert_eq!(WindowType::from_atom(" _NET_WM_WINDOW_TYPE_DIALOG"), WindowType::Dialog);
        assert_eq!(WindowType::from_atom("_NET_WM_WINDOW_TYPE_SPLASH"), WindowType::Other);
    }
}
