mod naver;

pub use naver::{BlogPost, NaverBlogClient};
