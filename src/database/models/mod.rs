pub mod company;
pub mod course;
pub mod lesson;
pub mod position;
pub mod user;

pub use company::Company;
pub use course::Course;
pub use lesson::Lesson;
pub use position::Position;
pub use user::User;
