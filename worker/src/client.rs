use anyhow::Result;
use async_trait::async_trait;
use common::{
    Assignment, Phase, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    TaskCompleteResponse, WorkerId,
};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::worker::TaskSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Habla con el coordinator por HTTP/JSON.
pub struct HttpTaskSource {
    client: Client,
    base_url: String,
    worker_id: WorkerId,
}

impl HttpTaskSource {
    pub fn new(base_url: &str, worker_id: WorkerId) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            worker_id,
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn request_task(&self) -> Result<Assignment> {
        let url = format!("{}/api/v1/tasks/next", self.base_url);
        let resp: TaskAssignmentResponse = self
            .client
            .post(&url)
            .json(&TaskAssignmentRequest {
                worker_id: self.worker_id.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.task)
    }

    async fn report_done(&self, phase: Phase, index: u32) -> Result<()> {
        let url = format!("{}/api/v1/tasks/complete", self.base_url);
        let resp: TaskCompleteResponse = self
            .client
            .post(&url)
            .json(&TaskCompleteRequest {
                worker_id: self.worker_id.clone(),
                phase,
                index,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !resp.newly_completed {
            debug!("{:?} {} ya había sido reportada por otro intento", phase, index);
        }
        Ok(())
    }
}
