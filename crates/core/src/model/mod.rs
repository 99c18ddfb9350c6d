mod ids;
mod knowledge;
mod progress;

pub use ids::{ChapterId, ParseIdError, TopicKey};
pub use knowledge::{Chapter, Difficulty, KnowledgeBase, KnowledgeBaseError, Quiz, Topic};
pub use progress::{ProgressSnapshot, SNAPSHOT_VERSION, Statistics};
