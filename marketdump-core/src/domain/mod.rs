//! Domain types for marketdump

pub mod bar;
pub mod kind;
pub mod tick;
pub mod window;

pub use bar::Bar;
pub use kind::{DataKind, TimeFrame};
pub use tick::{Quote, Tick, Trade};
pub use window::TimeWindow;
