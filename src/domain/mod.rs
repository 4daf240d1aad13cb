mod balance;
mod history;
mod points;

pub use balance::*;
pub use history::*;
pub use points::*;
