pub mod round;
pub mod time;

pub use round::fixed;
pub use time::current_timestamp;
