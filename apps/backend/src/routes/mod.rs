pub mod mastery;
pub mod rounds;
