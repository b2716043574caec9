pub mod course;
pub mod delivery;
pub mod professor;
pub mod program;
pub mod section;
pub mod term;

pub use course::{AreaField, Course};
pub use delivery::CourseDelivery;
pub use professor::Professor;
pub use program::Program;
pub use section::Section;
pub use term::{AcademicYear, Term};
