//! Cloud (AWS) subsystem.
//!
//! # Data Flow
//! ```text
//! CloudConfig (region, load timeout)
//!     → config.rs (load shared SdkConfig once, bounded by timeout)
//!     → clients.rs (identity provider, textract, rekognition clients)
//! ```
//!
//! Client construction does no I/O and cannot fail; credential or network
//! problems surface on first use.

pub mod clients;
pub mod config;

pub use clients::{
    new_identity_client, new_rekognition_client, new_textract_client, CloudClients,
    IdentityClient, RekognitionClient, TextractClient,
};
pub use config::{load_cloud_config, CloudError};
