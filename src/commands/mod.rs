pub mod bundle;
pub mod patch;
pub mod steam;
