use serde::Deserialize;

/// Acknowledgement body returned by write endpoints such as `POST /contact/submit`.
#[derive(Deserialize, Debug)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
