pub mod item;

pub use item::{Item, ItemChanges, ItemInput, ItemStatus, NewItem, ValidationError};
