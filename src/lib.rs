pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod feeds;
pub mod handlers;
pub mod homework;
pub mod injector;
pub mod models;
pub mod preferences;
pub mod schedule;
pub mod state;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use view::PopupView;
