// ABOUTME: REPL banner constants for the mscript binary

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "mscript -- MATLAB-compatible interpreter";
pub const WELCOME_SUBTITLE: &str = "type 'exit' or press Ctrl-D to quit";
