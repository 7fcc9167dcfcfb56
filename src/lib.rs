// Library API shared by the `wordbrain` CLI and the bench runner
pub mod board;
pub mod errors;
pub mod feedback;
pub mod letters;
pub mod log;
pub mod puzzle;
pub mod solver;
pub mod trie;
pub mod word_list;
