pub mod geometry;
pub mod pointer;
pub mod window;

pub use geometry::{Point, Rectangle};
pub use pointer::PointerSample;
pub use window::{HostEvent, TimerToken, WindowId, WindowSnapshot, WindowType};
