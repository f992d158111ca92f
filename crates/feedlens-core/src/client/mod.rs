mod http;

pub use http::{HealthStatus, HttpRemoteClient};

use crate::error::RemoteFailure;
use crate::model::{FeedbackItem, InsightsSnapshot};

pub type RemoteResult<T> = std::result::Result<T, RemoteFailure>;

/// The three calls the store makes against the analysis service.
///
/// Implementations normalize every failure (transport or application) into
/// a [`RemoteFailure`] message before returning.
pub trait RemoteClient: Send + Sync {
    /// Submit a new piece of feedback. The returned item usually has no
    /// enrichment yet.
    fn submit_feedback(
        &self,
        message: &str,
    ) -> impl std::future::Future<Output = RemoteResult<FeedbackItem>> + Send;

    /// Every feedback item, in the service's order.
    fn list_feedback(
        &self,
    ) -> impl std::future::Future<Output = RemoteResult<Vec<FeedbackItem>>> + Send;

    fn get_insights(
        &self,
    ) -> impl std::future::Future<Output = RemoteResult<InsightsSnapshot>> + Send;
}
