//! Client factories over the shared AWS configuration.

use aws_config::SdkConfig;

/// Managed identity provider (Cognito user pools).
pub type IdentityClient = aws_sdk_cognitoidentityprovider::Client;
/// Document text extraction.
pub type TextractClient = aws_sdk_textract::Client;
/// Image analysis.
pub type RekognitionClient = aws_sdk_rekognition::Client;

pub fn new_identity_client(config: &SdkConfig) -> IdentityClient {
    IdentityClient::new(config)
}

pub fn new_textract_client(config: &SdkConfig) -> TextractClient {
    TextractClient::new(config)
}

pub fn new_rekognition_client(config: &SdkConfig) -> RekognitionClient {
    RekognitionClient::new(config)
}

/// Every cloud client the service hands to its handlers.
#[derive(Debug, Clone)]
pub struct CloudClients {
    pub identity: IdentityClient,
    pub textract: TextractClient,
    pub rekognition: RekognitionClient,
}

impl CloudClients {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            identity: new_identity_client(config),
            textract: new_textract_client(config),
            rekognition: new_rekognition_client(config),
        }
    }
}
