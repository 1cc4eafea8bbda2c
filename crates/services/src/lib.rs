#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod remote;
pub mod resolver;
pub mod sources;

pub use app_services::AppServices;
pub use config::{QuizConfig, RemoteConfig};
pub use error::{AppServicesError, QuizError, SourceError};
pub use onboarding::{IntroState, OnboardingEvent, OnboardingService, QuizLoad};
pub use remote::HttpRemoteSource;
pub use resolver::QuizResolver;
pub use sources::{
    BundledQuizSource, DisabledRemoteSource, FileQuizSource, QuizLocalSource, QuizRemoteSource,
};
