pub mod db;
pub mod error;
pub mod finder;
pub mod models;
pub mod service;

pub use error::{Error, Result};
pub use service::FoodBlog;
