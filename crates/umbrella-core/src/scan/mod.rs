pub mod file;
pub mod read;
pub mod walk;
