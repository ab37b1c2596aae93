pub mod documents;
pub mod events;
pub mod process;
