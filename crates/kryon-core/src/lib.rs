// crates/kryon-core/src/lib.rs
pub mod error;
pub mod mappings;
pub mod properties;
pub mod elements;
pub mod tree;
pub mod variables;
pub mod component;
pub mod krb;

pub use error::{KryonError, Result};
pub use mappings::*;
pub use properties::*;
pub use elements::*;
pub use tree::*;
pub use variables::*;
pub use component::*;
pub use krb::*;
