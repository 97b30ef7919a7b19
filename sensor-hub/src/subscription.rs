use std::fmt;
use uuid::Uuid;

use sensor_common::types::{ExperienceId, SensorKind};

/// Identifies one subscription returned by `subscribe`.
///
/// Re-subscribing the same experience to the same kind creates a new
/// subscription, after which the old handle no longer matches anything.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: Uuid,
    experience_id: ExperienceId,
    kind: SensorKind,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: Uuid, experience_id: ExperienceId, kind: SensorKind) -> Self {
        Self {
            id,
            experience_id,
            kind,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn experience_id(&self) -> &ExperienceId {
        &self.experience_id
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.experience_id, self.kind, self.id)
    }
}
