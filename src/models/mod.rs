pub mod comment;
pub mod community;
pub mod listing;
pub mod post;
pub mod vote;

pub use comment::*;
pub use community::*;
pub use listing::*;
pub use post::*;
pub use vote::*;
