pub mod os;
pub mod paths;

pub use os::TargetOs;
