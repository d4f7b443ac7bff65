pub mod convert;
pub mod down;
pub mod status;
pub mod sync;
pub mod up;
pub mod wait;
