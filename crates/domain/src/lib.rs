//! Todo ドメイン
//!
//! エンティティ・識別子・フィールド検証・更新リクエストの組み立てを担当します。
//! 永続化より前にすべての入力をここで検証し、型付きのレコードに変換します。

pub mod errors;
pub mod input;
pub mod todo;
pub mod validation;

pub use errors::*;
pub use input::*;
pub use todo::*;
pub use validation::*;
