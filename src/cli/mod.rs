mod handler;

pub use handler::{parse_args, AppAction, USAGE};
