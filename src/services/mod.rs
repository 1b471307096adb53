pub mod dispatcher;
pub mod focus_engine;
pub mod host;
pub mod monitor_policy;
pub mod movement_guard;
pub mod position_memory;
pub mod remote;
pub mod timer;

pub use dispatcher::FocusDispatcher;
pub use host::create_backend;
pub use timer::TokioTimerScheduler;
