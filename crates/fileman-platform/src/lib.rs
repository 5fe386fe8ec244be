// Host filesystem abstraction

pub mod filesystem;
