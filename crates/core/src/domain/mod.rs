pub mod identity;
pub mod quote;
