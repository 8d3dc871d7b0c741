//! String helpers for artifact and path naming.

/// Reduce a display name to a safe component/file stem by keeping only
/// ASCII alphanumerics: "Stripe Payments!!" becomes "StripePayments".
pub fn sanitize_component_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Reduce an identifier to something safe to use as a directory segment.
/// Keeps alphanumerics, '-' and '_' so uuid-style ids survive unchanged.
pub fn sanitize_path_segment(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
