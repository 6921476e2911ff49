pub mod catalog;
pub mod notification;
pub mod progress;
pub mod routine;
pub mod user;

pub use catalog::{DifficultyLevel, ExerciseView, Page, ReferenceItem};
pub use notification::{Notification, NotificationType};
pub use progress::{UserRoutine, UserWorkoutLog, WorkoutLogDetails};
pub use routine::{Routine, RoutineDetails, TargetLevel, Workout, WorkoutExercise};
pub use user::{User, UserProfile};
