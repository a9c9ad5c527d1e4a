mod store;
pub use store::Store;

mod edge;
pub use edge::EdgeRow;

mod hydrate;

mod error;
pub use error::StoreError;
