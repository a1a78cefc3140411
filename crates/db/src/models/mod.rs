pub mod folder;
pub mod item;

pub use folder::{CreateFolder, Folder, OutputItem, OutputItems, SubmissionRecord};
pub use item::{CreateItem, Item};
