pub const API_VERSION: &str = "v1";

pub const API_PREFIX: &str = "/api/v1";

/// Upper bound for JSON request bodies.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Page size cap for invoice listings.
pub const MAX_PAGE_SIZE: usize = 200;
