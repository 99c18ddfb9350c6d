#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod presenter;
pub mod progress_service;
pub mod quiz_state;
pub mod session;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ImportError, ProgressServiceError, SessionError};
pub use presenter::{Presenter, TopicView};
pub use progress_service::ProgressService;
pub use quiz_state::{QuizState, TopicVisit};
pub use session::LearningSession;
