pub mod motion;
pub mod path;
pub mod session;
pub mod time;
