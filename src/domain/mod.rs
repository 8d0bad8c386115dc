pub mod cancel;
pub mod controller;
pub mod models;
pub mod settings;
pub mod timing;

#[cfg(test)]
mod tests {
    #[test]
    fn test_domain_does_not_depend_on_infrastructure() {
        let sources = [
            include_str!("cancel.rs"),
            include_str!("controller.rs"),
            include_str!("models.rs"),
            include_str!("settings.rs"),
            include_str!("timing.rs"),
        ];
        for source in sources {
            assert!(!source.contains("crate::infrastructure"));
        }
    }
}
