//! 更新系エントリポイント（toggle / create / update / delete）

pub mod handlers;
pub mod optimistic;

pub use handlers::*;
pub use optimistic::*;
