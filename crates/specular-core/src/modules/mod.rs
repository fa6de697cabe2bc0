pub mod abeles;
pub mod dispatch;
pub mod objective;
pub mod params;
pub mod profile;
pub mod stack;
