use tracing::instrument;

use jwtpipe_core::Result;

use crate::endpoints::{
    DASHBOARD, Dashboard, PROFILE, PROFILE_UPDATE, PROTECTED, ProfileUpdate,
    ProfileUpdateResponse, ProtectedResponse, User,
};
use crate::pipeline::RequestPipeline;

/// Account endpoints of the authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AccountsApi<'a> {
    pipeline: &'a RequestPipeline,
}

impl<'a> AccountsApi<'a> {
    pub fn new(pipeline: &'a RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Fetch the logged-in user's profile.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User> {
        self.pipeline.get(PROFILE).await
    }

    /// Change profile fields. Fields left `None` are not sent.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileUpdateResponse> {
        self.pipeline.put(PROFILE_UPDATE, update).await
    }

    #[instrument(skip(self))]
    pub async fn protected(&self) -> Result<ProtectedResponse> {
        self.pipeline.get(PROTECTED).await
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.pipeline.get(DASHBOARD).await
    }
}
