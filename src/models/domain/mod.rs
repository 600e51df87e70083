pub mod answer;
pub mod attempt;
pub mod exam;
pub mod question;
pub mod recommendation;
pub mod subject;
pub mod subject_performance;
pub use answer::Answer;
pub use attempt::{Attempt, AttemptCompletion, AttemptStatus};
pub use exam::{Exam, ExamQuestion, ExamStatus};
pub use question::{Difficulty, Question, QuestionOption, QuestionType};
pub use recommendation::{Recommendation, RecommendationType};
pub use subject::Subject;
pub use subject_performance::{StrengthLevel, SubjectPerformance};
