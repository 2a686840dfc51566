pub mod consumer;
pub mod dashboard;
pub mod home;
pub mod input;
pub mod ui;

pub use input::Screen;
