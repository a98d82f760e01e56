use super::RegistryEvent;
use crate::config::{PolicyConfig, RegistryConfig};
use crate::image::{ImageReference, PushContext};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const ECR_EVENT_SOURCE: &str = "ecr.amazonaws.com";

const PUT_IMAGE: &str = "PutImage";
const IMAGE_ALREADY_EXISTS: &str = "ImageAlreadyExistsException";
const UNKNOWN_ACTOR: &str = "*Unknown*";

/// Why an event was acknowledged without evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    UnknownSource,
    NotPutImage,
    ImageAlreadyExists,
    Untagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Evaluate {
        reference: ImageReference,
        push: PushContext,
    },
    Skip {
        reason: SkipReason,
    },
}

impl Route {
    const fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }
}

type Handler = fn(&Router, &RegistryEvent, DateTime<Utc>) -> Route;

/// Classifies registry events. Never touches the network; every outcome,
/// including skips, means the message may be acknowledged.
#[derive(Debug, Clone)]
pub struct Router {
    registry: RegistryConfig,
    skip_untagged: bool,
}

impl Router {
    pub fn new(registry: &RegistryConfig, policy: &PolicyConfig) -> Self {
        Self {
            registry: registry.clone(),
            skip_untagged: policy.skip_untagged,
        }
    }

    fn handler_for(source: &str) -> Option<Handler> {
        match source {
            ECR_EVENT_SOURCE => Some(Self::route_ecr),
            _ => None,
        }
    }

    pub fn route(&self, event: &RegistryEvent, now: DateTime<Utc>) -> Route {
        match Self::handler_for(&event.event_source) {
            Some(handler) => handler(self, event, now),
            None => {
                tracing::debug!(source = %event.event_source, "no handler for event source");
                Route::skip(SkipReason::UnknownSource)
            }
        }
    }

    fn route_ecr(&self, event: &RegistryEvent, now: DateTime<Utc>) -> Route {
        if event.event_name != PUT_IMAGE {
            return Route::skip(SkipReason::NotPutImage);
        }
        if event.error_code == IMAGE_ALREADY_EXISTS {
            tracing::info!("Image already exists ({})", event.error_message);
            return Route::skip(SkipReason::ImageAlreadyExists);
        }

        let params = &event.request_parameters;
        let repository = params.repository_name.clone();
        let tag = if params.image_tag.is_empty() {
            "latest".to_string()
        } else {
            params.image_tag.clone()
        };
        tracing::info!(repository = %repository, tag = %tag, "registry push received");

        let region = event
            .aws_region
            .clone()
            .unwrap_or_else(|| self.registry.fallback_region.clone());
        let registry_id = params.registry_id.clone();
        let pushed_at = event
            .event_time
            .clone()
            .unwrap_or_else(|| now.format("%Y-%m-%d %H:%M:%SZ").to_string())
            .replace('T', " ");
        let pushed_by = event
            .user_identity
            .user_name
            .clone()
            .or_else(|| event.user_identity.arn.clone())
            .unwrap_or_else(|| UNKNOWN_ACTOR.to_string());
        tracing::debug!(
            registry_id = %registry_id,
            region = %region,
            pushed_at = %pushed_at,
            pushed_by = %pushed_by,
            "registry push details"
        );

        let reference = ImageReference {
            registry_address: self.registry.registry_address(&registry_id, &region),
            registry_id,
            region,
            repository,
            tag,
        };

        if self.skip_untagged && reference.is_untagged() {
            tracing::info!("Skipping \"un-tagged\" image: {}", reference.repository);
            return Route::skip(SkipReason::Untagged);
        }

        Route::Evaluate {
            reference,
            push: PushContext {
                pushed_by,
                pushed_at,
            },
        }
    }
}
