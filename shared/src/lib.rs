pub mod path;
pub mod protocol;
pub mod types;
pub mod value;
