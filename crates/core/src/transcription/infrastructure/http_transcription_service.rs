use std::path::{Path, PathBuf};

use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::interchange::dataset_request::DatasetExportRequest;
use crate::segments::domain::segment::RawSegment;
use crate::shared::constants::{
    DATASET_EXPORT_ROUTE, TRANSCRIPT_RESULT_ROUTE, TRANSCRIPT_ROUTE, UPLOAD_ROUTE,
};
use crate::transcription::domain::transcription_service::{
    JobId, JobStatus, ServiceError, TranscriptionParams, TranscriptionService,
};

#[derive(Error, Debug)]
pub enum HttpServiceError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of an audio upload: the server-managed name and its playback URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedAudio {
    pub filename: String,
    pub file_url: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    result_id: String,
}

/// Body of `GET /transcript_result/<id>`.
#[derive(Debug, Deserialize)]
struct TaskResultBody {
    ready: bool,
    successful: bool,
    #[serde(default)]
    segments: Option<Vec<RawSegment>>,
}

impl TaskResultBody {
    fn into_status(self) -> JobStatus {
        if !self.ready {
            JobStatus::Pending
        } else if !self.successful {
            JobStatus::Failed
        } else {
            JobStatus::Ready(self.segments.unwrap_or_default())
        }
    }
}

/// Talks to the transcription web server over blocking HTTP.
pub struct HttpTranscriptionService {
    base_url: String,
    client: Client,
}

impl HttpTranscriptionService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Uploads an audio file as multipart field `file`.
    pub fn upload(&self, path: &Path) -> Result<UploadedAudio, HttpServiceError> {
        let url = self.url(UPLOAD_ROUTE, None);
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|e| HttpServiceError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| HttpServiceError::Request {
                url: url.clone(),
                source: e,
            })?;
        let uploaded: UploadedAudio = decode(check_status(response, &url)?, &url)?;
        log::info!("Uploaded {} as {}", path.display(), uploaded.filename);
        Ok(uploaded)
    }

    /// Requests a zip of per-segment audio clips and label files.
    pub fn export_dataset(
        &self,
        managed_name: &str,
        request: &DatasetExportRequest,
    ) -> Result<Vec<u8>, HttpServiceError> {
        let url = self.url(DATASET_EXPORT_ROUTE, Some(managed_name));
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| HttpServiceError::Request {
                url: url.clone(),
                source: e,
            })?;
        let bytes = check_status(response, &url)?
            .bytes()
            .map_err(|e| HttpServiceError::Decode {
                url: url.clone(),
                source: e,
            })?;
        Ok(bytes.to_vec())
    }

    fn url(&self, route: &str, tail: Option<&str>) -> String {
        match tail {
            Some(tail) => format!("{}/{route}/{tail}", self.base_url),
            None => format!("{}/{route}", self.base_url),
        }
    }
}

impl TranscriptionService for HttpTranscriptionService {
    fn submit(
        &self,
        audio_file: &str,
        params: &TranscriptionParams,
    ) -> Result<JobId, ServiceError> {
        let url = self.url(TRANSCRIPT_ROUTE, Some(audio_file));
        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .map_err(|e| HttpServiceError::Request {
                url: url.clone(),
                source: e,
            })?;
        let body: SubmitResponse = decode(check_status(response, &url)?, &url)?;
        Ok(JobId(body.result_id))
    }

    fn poll(&self, job: &JobId) -> Result<JobStatus, ServiceError> {
        let url = self.url(TRANSCRIPT_RESULT_ROUTE, Some(&job.0));
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| HttpServiceError::Request {
                url: url.clone(),
                source: e,
            })?;
        let body: TaskResultBody = decode(check_status(response, &url)?, &url)?;
        Ok(body.into_status())
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, HttpServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HttpServiceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    url: &str,
) -> Result<T, HttpServiceError> {
    response.json().map_err(|e| HttpServiceError::Decode {
        url: url.to_string(),
        source: e,
    })
}
