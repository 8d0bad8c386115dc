use crate::domain::models::DeviceRecord;

/// Name the motion controller advertises over Bluetooth
pub const MOTION_CONTROLLER_NAME: &str = "Motion Controller";

/// Decides which discovered devices the pairing protocol may touch.
#[derive(Debug, Clone)]
pub struct ControllerClassifier {
    product_name: String,
}

impl ControllerClassifier {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
        }
    }

    /// Exact, case-sensitive display name match.
    // TODO: also require class of device 0x00002508 once it is confirmed that
    // every controller revision reports it.
    pub fn is_target_controller(&self, record: &DeviceRecord) -> bool {
        record.name == self.product_name
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }
}

impl Default for ControllerClassifier {
    fn default() -> Self {
        Self::new(MOTION_CONTROLLER_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> DeviceRecord {
        DeviceRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_name_matches() {
        let classifier = ControllerClassifier::default();
        assert!(classifier.is_target_controller(&named("Motion Controller")));
    }

    #[test]
    fn test_near_names_do_not_match() {
        let classifier = ControllerClassifier::default();
        for name in [
            "motion controller",
            "Motion Controller ",
            "Motion",
            "Wireless Controller",
            "",
        ] {
            assert!(!classifier.is_target_controller(&named(name)), "{:?}", name);
        }
    }

    #[test]
    fn test_custom_product_name() {
        let classifier = ControllerClassifier::new("Navigation Controller");
        assert!(classifier.is_target_controller(&named("Navigation Controller")));
        assert!(!classifier.is_target_controller(&named("Motion Controller")));
    }
}
