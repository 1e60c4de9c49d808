//! CLI command implementations.
//!
//! | Module   | Commands handled   |
//! |----------|--------------------|
//! | `board`  | `Board`            |
//! | `issue`  | `Move`, `Add`      |
//! | `config` | `Config`           |
//! | `demo`   | `Demo`             |

pub mod board;
pub mod config;
pub mod demo;
pub mod issue;

pub use board::cmd_board;
pub use config::cmd_config;
pub use demo::cmd_demo;
pub use issue::{cmd_add, cmd_move};
