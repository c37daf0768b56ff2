pub mod comments;
pub mod communities;
pub mod posts;
