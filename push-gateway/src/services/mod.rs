pub mod metrics;
pub mod providers;

pub use metrics::{get_metrics, init_metrics, record_dispatch, record_provider_call};
pub use providers::{
    FcmProvider, MockPushProvider, MulticastMessage, MulticastReport, NotificationContent,
    ProviderError, PushProvider, SendError, SendOutcome,
};
