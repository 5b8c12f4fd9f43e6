pub mod calendar;
pub mod course;
pub mod registration;
pub mod required;
pub mod search;
pub mod slot;
pub mod user;

pub use calendar::{
    Calendar, CalendarId, CalendarRequest, PublicCalendarDetail, PublicLecture, VisibilityRequest,
    VisibilityResponse,
};
pub use course::{Course, CourseHit, CourseId, CourseSummary};
pub use registration::{
    BatchOutcome, ConflictEntry, CourseBatchRequest, ErrorEntry, Registration, RegisteredView,
    RequiredOutcome, RequiredRequest,
};
pub use required::RequiredCourse;
pub use search::{AnswerRequest, AnswerResponse, SearchParams, SearchRequest, SearchResponse};
pub use slot::{Slot, Weekday};
pub use user::{Credentials, CurrentUserResponse, User, UserId, UserInfo};
