pub mod amount;
pub mod clock;
