use super::{ApiError, IMAGE_FIELD, InferenceService};
use crate::upload::UploadedImage;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use shared::{ExplainResponse, PredictionResult};
use url::Url;

#[derive(Clone)]
pub struct HttpInferenceService {
    http_client: HttpClient,
    base_url: Url,
}

impl HttpInferenceService {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(HttpClient::new(), base_url)
    }

    pub fn with_client(http_client: HttpClient, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }
}

impl InferenceService for HttpInferenceService {
    async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, ApiError> {
        let url = self.endpoint("predict")?;
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime().as_str())?;
        let form = Form::new().part(IMAGE_FIELD, part);

        log::debug!("POST {}", url);
        let response = self.http_client.post(url).multipart(form).send().await?;
        read_json(response).await
    }

    async fn explain_all(&self) -> Result<ExplainResponse, ApiError> {
        let url = self.endpoint("explain_all")?;

        log::debug!("GET {}", url);
        let response = self.http_client.get(url).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::from_error_body(status.as_u16(), &body));
    }

    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{CandidateFile, ImageStager, ObjectUrlStore};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    // Answers exactly one request with the given status line and body, handing back the
    // raw request bytes.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (Url::parse(&format!("http://{}/api/", addr)).unwrap(), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let body_len = request.len() - (header_end + 4);
        match headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
        {
            Some(expected) => body_len >= expected,
            None if headers.contains("transfer-encoding: chunked") => text.ends_with("0\r\n\r\n"),
            None => true,
        }
    }

    fn service(base_url: Url) -> HttpInferenceService {
        let http_client = HttpClient::builder().no_proxy().build().unwrap();
        HttpInferenceService::with_client(http_client, base_url)
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let service = HttpInferenceService::new(Url::parse("http://localhost:8000/api/").unwrap());
        assert_eq!(
            service.endpoint("predict").unwrap().as_str(),
            "http://localhost:8000/api/predict"
        );
        assert_eq!(
            service.endpoint("explain_all").unwrap().as_str(),
            "http://localhost:8000/api/explain_all"
        );
    }

    #[tokio::test]
    async fn predict_posts_image_field_and_parses_result() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"prediction":"Malignant","confidence":"87.65","probabilities":{"Benign":"5.00","Malignant":"87.65","Normal":"7.35"}}"#,
        )
        .await;
        let mut stager = ImageStager::new(ObjectUrlStore::new());
        let image = stager
            .stage(CandidateFile::new("scan.png", "image/png", b"PNGDATA".to_vec()))
            .unwrap()
            .clone();

        let result = service(base_url).predict(&image).await.unwrap();
        assert_eq!(result.prediction, "Malignant");
        assert_eq!(result.probabilities.normal, "7.35");

        let request = server.await.unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /api/predict "));
        assert!(lowered.contains("content-type: multipart/form-data; boundary="));
        assert!(lowered.contains(r#"name="image""#));
        assert!(lowered.contains(r#"filename="scan.png""#));
        assert!(lowered.contains("content-type: image/png"));
        assert!(request.contains("PNGDATA"));
    }

    #[tokio::test]
    async fn explain_error_reads_detail_from_body() {
        let (base_url, server) = serve_once("503 Service Unavailable", r#"{"detail":"XAI model not loaded"}"#).await;

        let err = service(base_url).explain_all().await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 503, ref message } if message == "XAI model not loaded"
        ));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/explain_all "));
    }

    #[tokio::test]
    async fn error_without_detail_falls_back_to_status() {
        let (base_url, server) = serve_once("500 Internal Server Error", "oops").await;

        let err = service(base_url).explain_all().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! Status: 500");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn explain_success_keeps_missing_overlays_absent() {
        let (base_url, server) = serve_once("200 OK", r#"{"gradcam_image_base64":"AQID"}"#).await;

        let response = service(base_url).explain_all().await.unwrap();
        assert_eq!(response.gradcam_image_base64.as_deref(), Some("AQID"));
        assert!(response.lime_image_base64.is_none());
        server.await.unwrap();
    }
}
