pub mod logger;
pub mod text;
