pub mod calendar;
pub mod guard;
pub mod locks;
pub mod registration;
pub mod required;
pub mod search;

pub use calendar::CalendarService;
pub use locks::CalendarLocks;
pub use registration::RegistrationService;
pub use required::department_search_key;
pub use search::SearchService;
