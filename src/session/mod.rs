pub mod pin;
pub mod timer;

pub use pin::{PinOutcome, PinPad, is_valid_pin};
pub use timer::{SessionSink, SessionTimer, TickOutcome};
