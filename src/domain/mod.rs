pub mod folder;

pub mod item;
