pub mod auction;
pub mod logic;
