pub mod advertisement;
pub mod image;
pub mod shared;
