pub mod advertisement;
