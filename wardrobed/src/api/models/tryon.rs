use serde::{Deserialize, Serialize};

/// Model tuning parameters for a try-on run.
///
/// All fields are optional on the wire; absent ones take these defaults
/// before being forwarded to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct TryOnParams {
    pub steps: i64,
    pub scale: f64,
    pub seed: i64,
    pub accelerate: bool,
    pub repaint: bool,
}

impl Default for TryOnParams {
    fn default() -> Self {
        Self {
            steps: 30,
            scale: 2.5,
            seed: 42,
            accelerate: false,
            repaint: false,
        }
    }
}

/// The three generated images of a try-on run.
///
/// A slot the model produced in an unusable shape surfaces as `null` rather
/// than failing the whole run.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnImages {
    pub generated_image: Option<String>,
    pub generated_mask: Option<String>,
    pub generated_dense_pose: Option<String>,
}

/// Response for a try-on run
#[derive(Debug, Serialize, Deserialize)]
pub struct TryOnResponse {
    pub success: bool,
    pub data: TryOnImages,
}
