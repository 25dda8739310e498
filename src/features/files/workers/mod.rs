mod file_sweeper;

pub use file_sweeper::FileSweeper;
