use std::time::Duration;

use crate::types::{
    ApiError, AudioPart, BatchProgress, BatchRequest, CleanupRequest, CreatedProject, JobKind,
    ProjectInfo, ProjectSummary, RecordNum, RecordPatch, RecordRow, StatusRow, StatusRowsBody,
    SynthesisRequest, UploadReceipt,
};

/// Connection settings for the HTTP backend.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The backend contract the client depends on. Status-check endpoints are
/// idempotent: sampling repeatedly has no side effects.
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError>;

    /// Create a project from initial info; returns the new project id.
    async fn create_project(&self, info: &ProjectInfo) -> Result<String, ApiError>;

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError>;

    async fn project_info(&self, project_id: &str) -> Result<ProjectInfo, ApiError>;

    async fn save_project_info(&self, project_id: &str, info: &ProjectInfo)
        -> Result<(), ApiError>;

    async fn list_records(&self, project_id: &str) -> Result<Vec<RecordRow>, ApiError>;

    async fn patch_record(
        &self,
        project_id: &str,
        num: RecordNum,
        patch: &RecordPatch,
    ) -> Result<RecordRow, ApiError>;

    /// Launch a batch run on the worker; returns once the job is accepted.
    async fn start_batch(&self, project_id: &str, request: &BatchRequest) -> Result<(), ApiError>;

    /// Sample progress for the active `(kind, project)` pair.
    async fn check_status(&self, kind: JobKind, project_id: &str)
        -> Result<BatchProgress, ApiError>;

    /// One-shot fetch of the terminal per-item log.
    async fn status_rows(
        &self,
        kind: JobKind,
        project_id: &str,
    ) -> Result<Vec<StatusRow>, ApiError>;

    /// Re-run cleanup for a single record.
    async fn reprocess_record(
        &self,
        project_id: &str,
        num: RecordNum,
        request: &CleanupRequest,
    ) -> Result<(), ApiError>;

    /// Re-synthesize one audio part, optionally overriding its intonation.
    async fn synthesize_record(
        &self,
        project_id: &str,
        num: RecordNum,
        request: &SynthesisRequest,
    ) -> Result<(), ApiError>;

    async fn delete_audio(
        &self,
        project_id: &str,
        num: RecordNum,
        part: AudioPart,
    ) -> Result<(), ApiError>;

    /// Ingest a PDF; without a project id the backend creates one.
    async fn upload_pdf(
        &self,
        project_id: Option<&str>,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ApiError>;
}

/// `BackendApi` over HTTP, shaped by `ClientSettings`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base = reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl("base url cannot hold a path".to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}

fn expect_ok(response: &reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    expect_ok(&response)?;
    response.json::<T>().await.map_err(map_reqwest_error)
}

async fn read_ack(response: reqwest::Response) -> Result<(), ApiError> {
    expect_ok(&response)
}

#[async_trait::async_trait]
impl BackendApi for HttpBackend {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        let url = self.endpoint(&["api", "projects"])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn create_project(&self, info: &ProjectInfo) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "projects"])?;
        let response = self
            .client
            .post(url)
            .json(info)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let created: CreatedProject = read_json(response).await?;
        Ok(created.project_id)
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "projects", project_id])?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn project_info(&self, project_id: &str) -> Result<ProjectInfo, ApiError> {
        let url = self.endpoint(&["api", "projects", project_id, "info"])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn save_project_info(
        &self,
        project_id: &str,
        info: &ProjectInfo,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "projects", project_id, "info"])?;
        let response = self
            .client
            .post(url)
            .json(info)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn list_records(&self, project_id: &str) -> Result<Vec<RecordRow>, ApiError> {
        let url = self.endpoint(&["api", "records", project_id])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn patch_record(
        &self,
        project_id: &str,
        num: RecordNum,
        patch: &RecordPatch,
    ) -> Result<RecordRow, ApiError> {
        let url = self.endpoint(&["api", "records", project_id, &num.to_string()])?;
        let response = self
            .client
            .patch(url)
            .json(patch)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn start_batch(&self, project_id: &str, request: &BatchRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", request.kind().route(), "start", project_id])?;
        let builder = self.client.post(url);
        let builder = match request {
            BatchRequest::Cleanup(body) => builder.json(body),
            BatchRequest::Synthesis => builder,
        };
        let response = builder.send().await.map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn check_status(
        &self,
        kind: JobKind,
        project_id: &str,
    ) -> Result<BatchProgress, ApiError> {
        let url = self.endpoint(&["api", kind.route(), "check_status", project_id])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn status_rows(
        &self,
        kind: JobKind,
        project_id: &str,
    ) -> Result<Vec<StatusRow>, ApiError> {
        let url = self.endpoint(&["api", kind.route(), "status_rows", project_id])?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let body: StatusRowsBody = read_json(response).await?;
        Ok(body.rows)
    }

    async fn reprocess_record(
        &self,
        project_id: &str,
        num: RecordNum,
        request: &CleanupRequest,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "llm", "process", project_id, &num.to_string()])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn synthesize_record(
        &self,
        project_id: &str,
        num: RecordNum,
        request: &SynthesisRequest,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "tts", project_id, &num.to_string()])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn delete_audio(
        &self,
        project_id: &str,
        num: RecordNum,
        part: AudioPart,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "tts", project_id, &num.to_string(), part.route()])?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_ack(response).await
    }

    async fn upload_pdf(
        &self,
        project_id: Option<&str>,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(&["api", "upload"])?;
        let file = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", file);
        if let Some(project_id) = project_id {
            form = form.text("project_id", project_id.to_string());
        }
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}
