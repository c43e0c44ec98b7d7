//! One module per subcommand.  Each exposes an `execute` function that
//! `main` dispatches to.

pub mod add;
pub mod backup;
pub mod completions;
pub mod generate;
pub mod get;
pub mod keygen;
pub mod list;
