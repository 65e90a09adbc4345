//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable output.

pub const IRFORGE_DIAG_SCHEMA_VERSION: &str = "irforge.diag@0.1.0";
pub const IRFORGE_REPORT_SCHEMA_VERSION: &str = "irforge.report@0.1.0";
pub const IRFORGE_CHECK_CONFIG_SCHEMA_VERSION: &str = "irforge.check-config@0.1.0";

pub const IRFORGE_CHECK_CONFIG_SCHEMA_VERSIONS_SUPPORTED: &[&str] =
    &[IRFORGE_CHECK_CONFIG_SCHEMA_VERSION];
