// Library exports for integration tests and reusable components

#[doc(hidden)]
pub mod config;

pub mod credentials;
pub mod db;
pub mod discogs;
pub mod sync;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;
