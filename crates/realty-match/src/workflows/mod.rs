pub mod feed;
pub mod matching;
