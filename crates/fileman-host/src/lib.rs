// Host filesystem implementation over std::fs

pub mod filesystem;
