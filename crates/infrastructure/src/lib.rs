pub mod dynamodb;
pub mod models;
pub mod repositories;
pub mod views;

pub use dynamodb::*;
pub use models::*;
pub use repositories::*;
pub use views::*;
