// tabshelf shared type definitions
// Each submodule defines types used across the application.

pub mod collection;
pub mod errors;
pub mod gist;
pub mod settings;
pub mod sync;
