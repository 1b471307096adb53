use serde::{Deserialize, Serialize};
use std::fmt;

/// Точка в глобальных (мультимониторных) координатах
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Смещение точки относительно `origin`
    pub const fn relative_to(self, origin: Point) -> Self {
        Self {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }

    /// Евклидово расстояние между точками
    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Прямоугольник в глобальных координатах. Ширина и высота всегда >= 0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Прямоугольник 1x1 под указателем, так хост определяет монитор точки
    pub fn around_point(point: Point) -> Self {
        Self::new(point.x, point.y, 1, 1)
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Точка внутри прямоугольника, расширенного на `tolerance` с каждой стороны.
    /// Границы включаются.
    pub const fn contains_with_tolerance(&self, point: Point, tolerance: i32) -> bool {
        point.x >= self.x - tolerance
            && point.x <= self.right() + tolerance
            && point.y >= self.y - tolerance
            && point.y <= self.bottom() + tolerance
    }

    #[allow(dead_code)]
    pub const fn contains(&self, point: Point) -> bool {
        self.contains_with_tolerance(point, 0)
    }

    /// Площадь пересечения двух прямоугольников (0, если не пересекаются)
    pub fn overlap_area(&self, other: &Rectangle) -> i64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0;
        }
        i64::from(right - left) * i64::from(bottom - top)
    }
}

/// Монитор с наибольшей площадью пересечения с прямоугольником
pub fn monitor_index_for_rect(monitors: &[Rectangle], rect: &Rectangle) -> Option<usize> {
    monitors
        .iter()
        .enumerate()
        .map(|(index, monitor)| (index, monitor.overlap_area(rect)))
        .filter(|(_, area)| *area > 0)
        .max_by_key(|(index, area)| (*area, std::cmp::Reverse(*index)))
        .map(|(index, _)| index)
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}
