/// Chart version resolution
pub mod chart;

/// Image selection
pub mod image;

/// Version command handlers
pub mod version;
