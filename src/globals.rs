/// Global trioscope program name
///
/// All client code should refer directly to these copies instead of using various possibly
/// conflicting environment variables
pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
