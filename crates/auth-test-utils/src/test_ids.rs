//! Fixed test identifiers for deterministic tests
//!
//! Only key material and token ids are random; everything a test asserts on
//! comes from here.

// Users
pub const DEFAULT_USER: &str = "AUTH_ADM";
pub const TEST_USER_SOME: &str = "SOME_USER";
pub const TEST_USER_ALICE: &str = "alice";

/// Appended to the subject to derive `user_id` when none is given.
pub const USER_ID_SUFFIX: &str = "_ID";

// Client IDs
pub const DEFAULT_CLIENT_ID: &str = "test-client-id";
pub const TEST_CLIENT_ID_OTHER: &str = "other-test-client";

// Roles (Spring-style authorities)
pub const ROLE_RECALL_READWRITE: &str = "ROLE_PPUD_AUTOMATION__RECALL__READWRITE";
pub const ROLE_TESTS_READWRITE: &str = "ROLE_PPUD_AUTOMATION__TESTS__READWRITE";

// Scopes
pub const SCOPE_READ: &str = "read";
pub const SCOPE_WRITE: &str = "write";

/// Lifetime of tokens minted by `set_authorization`, in seconds.
pub const AUTHORIZATION_TOKEN_TTL_SECONDS: i64 = 3600;

// Key ID prefix for generated signing keys
pub const TEST_KEY_ID_PREFIX: &str = "test-key";
