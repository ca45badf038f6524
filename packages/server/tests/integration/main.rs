mod advertisement;
mod docs;
