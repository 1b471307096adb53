//! Host backends: responsibility and boundaries
//!
//! This module and its submodules only talk to the window manager: they answer
//! window/monitor/pointer queries, move the pointer on request and translate host
//! notifications into HostEvent(s). They MUST NOT decide whether the pointer should
//! move. All warp decisions are made exclusively by FocusEngine.

mod dry_run;
mod r#trait;
mod x11;

pub use self::r#trait::{create_backend, Backend, SignalSourceTrait, WindowHost};
