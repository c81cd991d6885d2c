//! 参照系エントリポイント（一覧 / 単一取得）

pub mod handlers;

pub use handlers::*;
