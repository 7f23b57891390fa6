pub mod breakeven;
pub mod cet;
pub mod compare;
pub mod consortium;
pub mod financing;
