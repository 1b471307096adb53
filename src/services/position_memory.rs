use crate::events::{Point, Rectangle, WindowId};
use crate::debug_if_enabled;
use std::collections::HashMap;

/// Позиция указателя относительно левого верхнего угла окна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeOffset {
    pub relative_x: i32,
    pub relative_y: i32,
}

impl RelativeOffset {
    fn fits(&self, rect: &Rectangle) -> bool {
        (0..=rect.width).contains(&self.relative_x) && (0..=rect.height).contains(&self.relative_y)
    }
}

/// Память последних позиций указателя по окнам.
///
/// Записи удаляются явно через `forget` при снятии окна с управления.
#[derive(Debug, Default)]
pub struct PositionMemory {
    offsets: HashMap<WindowId, RelativeOffset>,
}

impl PositionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запомнить позицию. Если указатель вне окна, запоминать нечего.
    pub fn save(&mut self, window: WindowId, pointer: Point, window_rect: Rectangle) {
        let relative = pointer.relative_to(window_rect.origin());
        let offset = RelativeOffset {
            relative_x: relative.x,
            relative_y: relative.y,
        };

        if !offset.fits(&window_rect) {
            debug_if_enabled!("Указатель {} вне окна {}, позиция не сохранена", pointer, window);
            return;
        }

        debug_if_enabled!("Сохранена позиция {:?} для окна {}", offset, window);
        self.offsets.insert(window, offset);
    }

    /// Точка для перемещения: сохранённая позиция, если она ещё помещается в окно,
    /// иначе центр окна
    pub fn load(&self, window: WindowId, window_rect: Rectangle) -> Point {
        match self.offsets.get(&window) {
            Some(offset) if offset.fits(&window_rect) => Point::new(
                window_rect.x + offset.relative_x,
                window_rect.y + offset.relative_y,
            ),
            Some(_) => {
                debug_if_enabled!("Сохранённая позиция окна {} устарела, используем центр", window);
                window_rect.center()
            }
            None => window_rect.center(),
        }
    }

    pub fn forget(&mut self, window: WindowId) {
        if self.offsets.remove(&window).is_some() {
            debug_if_enabled!("Позиция окна {} забыта", window);
        }
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
