//! Terminal user interface

pub mod app;
pub mod conversation;
pub mod landing;

pub use app::App;
