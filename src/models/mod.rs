mod post;

pub use post::{Category, CategoryFilter, NewPost, Post, PostFilter, PostStats, RawPost};
