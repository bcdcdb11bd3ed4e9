pub mod capability;
pub mod command;
pub mod file;
pub mod manifest;
pub mod registry;
pub mod sample;
pub mod selection;
pub mod streams;
pub mod version;
