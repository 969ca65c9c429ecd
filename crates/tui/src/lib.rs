mod app;
pub mod confirm;
pub mod event;
mod fields;
pub mod ui;

pub use app::App;
pub use fields::Field;
