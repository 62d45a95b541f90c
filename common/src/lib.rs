pub mod clock;
pub mod display;
pub mod logging;
pub mod prayer;
pub mod server;
