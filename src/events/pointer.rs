use super::geometry::Point;
use std::time::Instant;

/// Сырое событие движения указателя. Хранится только последнее.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSample {
    pub position: Point,
    pub timestamp: Instant,
}

impl PointerSample {
    pub fn new(position: Point, timestamp: Instant) -> Self {
        Self { position, timestamp }
    }

    pub fn now(position: Point) -> Self {
        Self::new(position, Instant::now())
    }
}
