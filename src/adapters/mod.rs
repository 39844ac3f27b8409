// Adapters layer: concrete implementations of the domain ports.

pub mod storage;
pub mod vk;

pub use storage::LocalStorage;
pub use vk::{VkClient, VkClientOptions};
