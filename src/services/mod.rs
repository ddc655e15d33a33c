pub mod analysis;
pub mod posters;
pub mod providers;
pub mod wordcloud;

pub use analysis::{Analysis, Analyzer};
