pub mod loan;
pub mod returns;
pub mod syndication;
