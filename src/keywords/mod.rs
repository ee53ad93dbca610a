mod upload;

pub use upload::parse_keyword_upload;
