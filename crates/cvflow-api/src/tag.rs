use serde::{Deserialize, Serialize};

use cvflow_types::DeviceId;

/// One device-level tag assignment, e.g. `hostname` -> `leaf1`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceTag {
    pub device_id: DeviceId,
    pub label: String,
    pub value: String,
}

impl DeviceTag {
    pub fn new(
        device_id: DeviceId,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { device_id, label: label.into(), value: value.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_json() {
        let tag = DeviceTag::new(DeviceId::new("JPE123"), "hostname", "leaf1");
        let json = serde_json::to_string(&tag).unwrap();
        let back: DeviceTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}
