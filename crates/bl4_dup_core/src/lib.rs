//! Borderlands 4 character save duplication.
//!
//! - [`steam_id`]: account key id from the standard save layout
//! - [`codec`]: the container codec contract and the game's AES/zlib format
//! - [`grammar`] and [`node`]: YAML plaintext as an ordered tagged-variant tree
//! - [`core_api`]: load, mutate, clone and persist documents
//! - [`saves`]: default save directory discovery
pub mod codec;
pub mod core_api;
pub mod grammar;
pub mod node;
pub mod saves;
pub mod steam_id;
