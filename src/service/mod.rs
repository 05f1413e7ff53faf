pub mod catalog;
pub mod rating;
pub mod resolver;
pub mod statistics;
