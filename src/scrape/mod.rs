// src/scrape/mod.rs
pub mod pool;
mod scrape;

pub use scrape::Submissions;
pub use scrape::collect_quiz_scores;
pub use scrape::collect_submissions;
pub use scrape::collect_tasks;
pub use scrape::discover_quizzes;
pub use scrape::discover_tasks;
pub use scrape::list_courses;
pub use scrape::list_groups;
pub use scrape::select_group;
pub use scrape::select_tasks;
