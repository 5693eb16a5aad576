//! Shared AWS configuration loading.

use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

use crate::config::CloudConfig;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("loading AWS configuration for region `{region}` timed out after {timeout:?}")]
    LoadTimeout { region: String, timeout: Duration },
}

/// Load the default AWS configuration chain for the configured region.
pub async fn load_cloud_config(config: &CloudConfig) -> Result<SdkConfig, CloudError> {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    let sdk_config = if config.load_timeout.is_zero() {
        loader.load().await
    } else {
        tokio::time::timeout(config.load_timeout, loader.load())
            .await
            .map_err(|_| CloudError::LoadTimeout {
                region: config.region.clone(),
                timeout: config.load_timeout,
            })?
    };

    tracing::info!(region = %config.region, "AWS configuration loaded");
    Ok(sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_configured_region() {
        let config = CloudConfig {
            region: "eu-west-1".into(),
            load_timeout: Duration::from_secs(10),
        };

        let sdk_config = load_cloud_config(&config).await.unwrap();
        assert_eq!(sdk_config.region(), Some(&Region::new("eu-west-1")));
    }
}
