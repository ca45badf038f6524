pub mod advertisement;
pub mod assets;
pub mod health;
pub mod image;
