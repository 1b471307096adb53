use crate::config::Config;
use crate::error::{MffError, Result};
use crate::events::geometry::monitor_index_for_rect;
use crate::events::{HostEvent, Point, PointerSample, Rectangle, WindowId, WindowSnapshot, WindowType};
use crate::{mff_error, trace_if_enabled};
use std::collections::{HashMap, HashSet};
use std::process::Command;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use super::r#trait::{SignalSourceTrait, WindowHost};

/// Раз во сколько тактов опроса пересматривается список окон
const WINDOW_SCAN_EVERY: u64 = 20;

fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| mff_error!(host, "{} не найден: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(mff_error!(host, "{} вернул ошибку: {}", program, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Разбор вывода `--shell` у xdotool: строки вида `KEY=VALUE`
fn parse_shell_vars(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn shell_int(vars: &HashMap<String, String>, key: &str) -> Option<i32> {
    vars.get(key).and_then(|value| value.parse().ok())
}

/// Разбор `xrandr --listmonitors`:
/// ` 0: +*DP-1 2560/597x1440/336+0+0  DP-1`
fn parse_xrandr_monitors(output: &str) -> (Vec<Rectangle>, usize) {
    let mut monitors = Vec::new();
    let mut primary = 0;

    for line in output.lines().skip_while(|line| line.starts_with("Monitors:")) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let Some(rect) = parse_xrandr_geometry(parts[2]) else {
            debug!("Не удалось разобрать строку монитора: '{}'", line);
            continue;
        };

        if parts[1].contains('*') {
            primary = monitors.len();
        }
        monitors.push(rect);
    }

    (monitors, primary)
}

/// `2560/597x1440/336+0+0` -> 2560x1440+0+0
fn parse_xrandr_geometry(geometry: &str) -> Option<Rectangle> {
    let (width_part, rest) = geometry.split_once('x')?;
    let mut fields = rest.split('+');
    let height_part = fields.next()?;
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;

    let width = width_part.split('/').next()?.parse().ok()?;
    let height = height_part.split('/').next()?.parse().ok()?;

    Some(Rectangle::new(x, y, width, height))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WmctrlWindow {
    id: WindowId,
    desktop: i64,
    rect: Rectangle,
    title: String,
}

/// Разбор `wmctrl -lG`:
/// `0x03a00003  0 10   20   1920 1080 host Title words`
fn parse_wmctrl_windows(output: &str) -> Vec<WmctrlWindow> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 7 {
                return None;
            }

            let id = u64::from_str_radix(parts[0].trim_start_matches("0x"), 16).ok()?;
            let desktop = parts[1].parse().ok()?;
            let x = parts[2].parse().ok()?;
            let y = parts[3].parse().ok()?;
            let width = parts[4].parse().ok()?;
            let height = parts[5].parse().ok()?;

            Some(WmctrlWindow {
                id: WindowId(id),
                desktop,
                rect: Rectangle::new(x, y, width, height),
                title: parts[7..].join(" "),
            })
        })
        .collect()
}

/// Текущий рабочий стол из `wmctrl -d` (строка со звёздочкой)
fn parse_wmctrl_current_desktop(output: &str) -> Option<i64> {
    output.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [index, "*", ..] => index.parse().ok(),
            _ => None,
        }
    })
}

/// Значение свойства из вывода xprop: `NAME(TYPE) = value`
fn xprop_value<'a>(output: &'a str, property: &str) -> Option<&'a str> {
    output
        .lines()
        .filter(|line| line.starts_with(property))
        .find_map(|line| line.split_once(" = ").map(|(_, value)| value))
}

/// Окно декорировано, если хотя бы одна из рамок `_NET_FRAME_EXTENTS` ненулевая
fn parse_frame_extents(output: &str) -> bool {
    xprop_value(output, "_NET_FRAME_EXTENTS")
        .map(|value| {
            value
                .split(',')
                .filter_map(|extent| extent.trim().parse::<u32>().ok())
                .any(|extent| extent > 0)
        })
        .unwrap_or(false)
}

/// Первый атом `_NET_WM_WINDOW_TYPE`; без свойства окно считается обычным
fn parse_window_type(output: &str) -> WindowType {
    xprop_value(output, "_NET_WM_WINDOW_TYPE")
        .and_then(|value| value.split(',').next())
        .map(WindowType::from_atom)
        .unwrap_or(WindowType::Normal)
}

/// Хост X11 поверх xdotool, wmctrl, xrandr и xprop
pub struct X11Host;

impl X11Host {
    pub fn new() -> Self {
        Self
    }

    pub fn check_available() -> Result<()> {
        for program in ["xdotool", "wmctrl", "xrandr", "xprop"] {
            if Command::new("which").arg(program).output().map(|o| o.status.success()).ok() != Some(true) {
                return Err(MffError::ServiceUnavailable(format!(
                    "{} не установлен, используйте --dry-run",
                    program
                )));
            }
        }

        if std::env::var("DISPLAY").is_err() {
            return Err(MffError::ServiceUnavailable("Переменная DISPLAY не задана".to_string()));
        }

        Ok(())
    }

    fn monitors(&self) -> (Vec<Rectangle>, usize) {
        match run_command("xrandr", &["--listmonitors"]) {
            Ok(output) => parse_xrandr_monitors(&output),
            Err(e) => {
                warn!("Не удалось получить список мониторов: {}", e);
                (Vec::new(), 0)
            }
        }
    }

    fn window_type(&self, id: WindowId) -> WindowType {
        run_command("xprop", &["-id", &id.value().to_string(), "_NET_WM_WINDOW_TYPE"])
            .map(|output| parse_window_type(&output))
            .unwrap_or(WindowType::Other)
    }

    fn list_windows(&self) -> Result<Vec<WmctrlWindow>> {
        run_command("wmctrl", &["-lG"]).map(|output| parse_wmctrl_windows(&output))
    }

    fn current_desktop(&self) -> Option<i64> {
        run_command("wmctrl", &["-d"])
            .ok()
            .and_then(|output| parse_wmctrl_current_desktop(&output))
    }
}

impl WindowHost for X11Host {
    fn focus_window(&self) -> Option<WindowId> {
        run_command("xdotool", &["getactivewindow"])
            .ok()
            .and_then(|output| output.trim().parse().ok())
            .map(WindowId)
    }

    fn window_snapshot(&self, id: WindowId) -> Option<WindowSnapshot> {
        let id_arg = id.value().to_string();

        let geometry = run_command("xdotool", &["getwindowgeometry", "--shell", &id_arg]).ok()?;
        let vars = parse_shell_vars(&geometry);
        let rect = Rectangle::new(
            shell_int(&vars, "X")?,
            shell_int(&vars, "Y")?,
            shell_int(&vars, "WIDTH")?,
            shell_int(&vars, "HEIGHT")?,
        );

        let title = run_command("xdotool", &["getwindowname", &id_arg])
            .map(|output| output.trim().to_string())
            .unwrap_or_default();

        let properties = run_command("xprop", &["-id", &id_arg, "_NET_FRAME_EXTENTS", "_NET_WM_WINDOW_TYPE"])
            .unwrap_or_default();

        // В X11 нет понятия "плавающего" окна на уровне оконного менеджера
        Some(
            WindowSnapshot::new(id, rect)
                .with_title(title)
                .with_decorations(parse_frame_extents(&properties))
                .with_type(parse_window_type(&properties)),
        )
    }

    fn pointer(&self) -> Result<Point> {
        let output = run_command("xdotool", &["getmouselocation", "--shell"])?;
        let vars = parse_shell_vars(&output);
        match (shell_int(&vars, "X"), shell_int(&vars, "Y")) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err(mff_error!(host, "Неожиданный вывод getmouselocation: '{}'", output.trim())),
        }
    }

    fn warp_pointer(&mut self, target: Point) -> Result<()> {
        debug!("xdotool mousemove {}", target);
        run_command(
            "xdotool",
            &["mousemove", "--", &target.x.to_string(), &target.y.to_string()],
        )?;
        Ok(())
    }

    fn monitor_index_for_rect(&self, rect: Rectangle) -> Option<usize> {
        let (monitors, _) = self.monitors();
        monitor_index_for_rect(&monitors, &rect)
    }

    fn monitor_geometry(&self, index: usize) -> Option<Rectangle> {
        self.monitors().0.get(index).copied()
    }

    fn primary_monitor(&self) -> usize {
        self.monitors().1
    }

    fn normal_window_count_on(&self, monitor: usize) -> usize {
        let (monitors, _) = self.monitors();
        let current_desktop = self.current_desktop();
        let windows = match self.list_windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось получить список окон: {}", e);
                return 0;
            }
        };

        windows
            .iter()
            // -1 означает "на всех рабочих столах"
            .filter(|window| window.desktop == -1 || Some(window.desktop) == current_desktop)
            .filter(|window| monitor_index_for_rect(&monitors, &window.rect) == Some(monitor))
            .filter(|window| self.window_type(window.id) == WindowType::Normal)
            .count()
    }

    fn overview_visible(&self) -> bool {
        false
    }

    fn focus_workspace(&mut self, index: u32) -> Result<()> {
        info!("Переключение на рабочий стол {}", index);
        run_command("wmctrl", &["-s", &index.to_string()])?;
        Ok(())
    }

    fn hide_overview(&mut self) -> Result<()> {
        debug!("В X11 нет режима обзора, скрывать нечего");
        Ok(())
    }

    fn clear_notifications(&mut self) -> Result<()> {
        info!("Очистка уведомлений");
        run_command("dunstctl", &["close-all"])?;
        Ok(())
    }
}

/// Опрос X11: движение мыши, смена активного окна, появление и закрытие окон
pub struct X11SignalSource {
    config: Arc<Config>,
    host: X11Host,
    known_windows: HashSet<WindowId>,
    last_pointer: Option<Point>,
    last_focus: Option<WindowId>,
}

impl X11SignalSource {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            host: X11Host::new(),
            known_windows: HashSet::new(),
            last_pointer: None,
            last_focus: None,
        }
    }

    async fn run_impl(mut self, tx: mpsc::Sender<HostEvent>) -> Result<()> {
        info!(
            "Запуск опроса X11 с интервалом {}мс",
            self.config.backend.polling_interval_ms
        );

        let mut interval = interval(Duration::from_millis(self.config.backend.polling_interval_ms));
        let mut tick: u64 = 0;

        loop {
            interval.tick().await;

            let events = self.poll(tick % WINDOW_SCAN_EVERY == 0);
            tick += 1;

            for event in events {
                trace_if_enabled!("X11 событие: {}", event);
                if tx.send(event).await.is_err() {
                    info!("Цикл событий закрыт, опрос X11 остановлен");
                    return Ok(());
                }
            }
        }
    }

    fn poll(&mut self, scan_windows: bool) -> Vec<HostEvent> {
        let mut events = Vec::new();

        // Сначала окна: фокус нового окна должен прийти после его появления
        if scan_windows {
            self.scan_windows(&mut events);
        }

        match self.host.pointer() {
            Ok(position) if self.last_pointer != Some(position) => {
                // Первая позиция не движение, а начальное состояние
                if self.last_pointer.is_some() {
                    events.push(HostEvent::Motion(PointerSample::now(position)));
                }
                self.last_pointer = Some(position);
            }
            Ok(_) => {}
            Err(e) => debug!("Не удалось получить позицию указателя: {}", e),
        }

        let focus = self.host.focus_window();
        if focus != self.last_focus {
            if let Some(id) = focus {
                if !self.known_windows.contains(&id) {
                    self.scan_windows(&mut events);
                }
            }
            self.last_focus = focus;
            events.push(HostEvent::FocusChanged(focus));
        }

        events
    }

    fn scan_windows(&mut self, events: &mut Vec<HostEvent>) {
        let windows = match self.host.list_windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось получить список окон: {}", e);
                return;
            }
        };

        let current: HashSet<WindowId> = windows.iter().map(|window| window.id).collect();

        for window in &windows {
            if self.known_windows.contains(&window.id) {
                continue;
            }
            let snapshot = self
                .host
                .window_snapshot(window.id)
                .unwrap_or_else(|| WindowSnapshot::new(window.id, window.rect).with_title(window.title.clone()));
            events.push(HostEvent::WindowCreated(snapshot));
        }

        for gone in self.known_windows.difference(&current) {
            events.push(HostEvent::WindowUnmanaged(*gone));
        }

        self.known_windows = current;
    }
}

#[async_trait::async_trait]
impl SignalSourceTrait for X11SignalSource {
    async fn run(self: Box<Self>, tx: mpsc::Sender<HostEvent>) -> Result<()> {
        (*self).run_impl(tx).await
    }
}
